//! Keyword checks over normalized AUT output.
pub const PRODUCT_ADDED: &str = "produit ajoute";
pub const PRODUCT_LIST: &str = "liste des produits";
pub const PRODUCT_MODIFIED: &str = "produit modifie";
pub const PRODUCT_DELETED: &str = "produit supprime";

/// Generic failure vocabulary of the AUT, already normalized.
pub const FAILURE_SIGNATURES: &[&str] = &[
    "erreur",
    "exception",
    "invalid",
    "segfault",
    "inexistant",
    "crash",
];

/// Input-validation prompts that legitimately contain a failure keyword.
pub const BENIGN_PHRASES: &[&str] = &["entree invalide. veuillez entrer un entier non negatif"];

/// Signatures of bugs that were fixed once and must not come back.
pub const REGRESSION_SIGNATURES: &[&str] = &[
    "segmentation fault",
    "memory corruption",
    "unhandled exception",
    "invalid input",
    "freeze",
    "crash",
];

/// What a scenario requires of, and forbids in, the AUT output.
#[derive(Debug, Clone, Default)]
pub struct Expectations {
    pub required: Vec<&'static str>,
    pub forbidden: Vec<&'static str>,
    pub allowed: Vec<&'static str>,
}

impl Expectations {
    /// Required phrases plus the standard failure vocabulary and allow-list.
    pub fn requiring(required: &[&'static str]) -> Self {
        Expectations {
            required: required.to_vec(),
            forbidden: FAILURE_SIGNATURES.to_vec(),
            allowed: BENIGN_PHRASES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub missing: Vec<String>,
    pub forbidden_found: Vec<String>,
}

impl Analysis {
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        for phrase in &self.missing {
            failures.push(format!("absent: {phrase:?}"));
        }
        for phrase in &self.forbidden_found {
            failures.push(format!("failure indicator: {phrase:?}"));
        }
        failures
    }
}

pub fn analyze_normalized(normalized: &str, expectations: &Expectations) -> Analysis {
    let missing = expectations
        .required
        .iter()
        .filter(|phrase| !normalized.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect();
    let scrubbed = strip_allowed(normalized, &expectations.allowed);
    let forbidden_found = expectations
        .forbidden
        .iter()
        .filter(|phrase| scrubbed.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect();
    Analysis {
        missing,
        forbidden_found,
    }
}

/// Remove every allow-listed phrase so its keywords do not count as failures.
pub fn strip_allowed(normalized: &str, allowed: &[&str]) -> String {
    let mut text = normalized.to_string();
    for phrase in allowed {
        text = text.replace(phrase, " ");
    }
    text
}

pub fn count_occurrences(normalized: &str, phrase: &str) -> usize {
    normalized.matches(phrase).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn analyze(output: &str, expectations: &Expectations) -> Analysis {
        analyze_normalized(&normalize(output), expectations)
    }

    #[test]
    fn add_confirmation_passes() {
        let output = "Votre choix : Nom : Quantité : Prix : Produit ajouté avec succès.\nAu revoir !";
        let analysis = analyze(output, &Expectations::requiring(&[PRODUCT_ADDED]));
        assert_eq!(analysis, Analysis::default());
    }

    #[test]
    fn benign_validation_prompt_is_not_a_failure() {
        let output = "Votre choix : Entrée invalide. Veuillez entrer un entier non négatif.\n";
        let analysis = analyze(output, &Expectations::requiring(&[]));
        assert_eq!(analysis, Analysis::default());
    }

    #[test]
    fn invalid_outside_allow_list_still_fails() {
        let output = "Entrée invalide. Veuillez entrer un entier non négatif.\nID invalide";
        let analysis = analyze(output, &Expectations::requiring(&[]));
        assert_eq!(analysis.forbidden_found, ["invalid"]);
        assert!(analysis.missing.is_empty());
    }

    #[test]
    fn missing_and_forbidden_are_both_reported() {
        let output = "Produit inexistant.";
        let analysis = analyze(output, &Expectations::requiring(&[PRODUCT_DELETED]));
        assert_eq!(analysis.missing, ["produit supprime"]);
        assert_eq!(analysis.forbidden_found, ["inexistant"]);
        assert_eq!(
            analysis.failures(),
            [
                "absent: \"produit supprime\"",
                "failure indicator: \"inexistant\""
            ]
        );
    }

    #[test]
    fn counts_confirmations() {
        let normalized = normalize("Produit supprimé.\nProduit supprimé.");
        assert_eq!(count_occurrences(&normalized, PRODUCT_DELETED), 2);
        assert_eq!(count_occurrences("", PRODUCT_DELETED), 0);
    }
}
