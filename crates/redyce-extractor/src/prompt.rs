//! Prompt construction for requirement extraction

use redyce_domain::DocumentKind;

/// Fixed system instruction sent with every extraction request
pub const SYSTEM_INSTRUCTION: &str = r#"You are an assistant that analyses French public tender documents (appels d'offres).
Extract the requirements the candidate must satisfy from the document you are given.

Rules:
- Only extract requirements that are literally present in the document. Never invent one.
- Give each requirement a short title and a description.
- When the document states a code or article number, put it in "code".
- Assign "priority" HIGH, MED or LOW. When you are unsure, use LOW.
- When you know the page, put it in "page"; put the exact supporting sentence in "quote".

Reply with JSON only, in this shape:
{"requirements":[{"title":"...","description":"...","code":null,"category":null,"priority":"LOW","page":null,"quote":null}]}
If the document contains no requirement, reply {"requirements":[]}."#;

/// Builds the user message for one document
pub struct PromptBuilder<'a> {
    text: &'a str,
    document_name: Option<&'a str>,
    kind: Option<DocumentKind>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt over (possibly windowed) document text
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            document_name: None,
            kind: None,
        }
    }

    /// Name the source file
    pub fn with_document_name(mut self, name: &'a str) -> Self {
        self.document_name = Some(name);
        self
    }

    /// Attach the tender document category
    pub fn with_kind(mut self, kind: Option<DocumentKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Build the user message
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(self.text.len() + 256);

        if let Some(name) = self.document_name {
            prompt.push_str(&format!("Document: {}\n", name));
        }
        if let Some(kind) = self.kind.filter(|k| *k != DocumentKind::Other) {
            prompt.push_str(&format!("Type: {} ({})\n", kind.as_str(), describe(kind)));
        }

        prompt.push_str("\nDocument text:\n---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n\n");
        prompt.push_str(r#"Reply with the {"requirements":[...]} JSON object only."#);
        prompt
    }
}

fn describe(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Rc => "règlement de consultation",
        DocumentKind::Cctp => "cahier des clauses techniques particulières",
        DocumentKind::Ccap => "cahier des clauses administratives particulières",
        DocumentKind::Dpgf => "décomposition du prix global et forfaitaire",
        DocumentKind::Ae => "acte d'engagement",
        DocumentKind::Other => "autre",
    }
}
