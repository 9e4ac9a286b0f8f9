//! Template dispatch
//!
//! An explicit table of supported `(Family, Language)` pairs. A lookup either
//! yields a `Renderer` binding the family builder to the language printer, or
//! fails with `UnsupportedLanguage` before any rendering work starts.

use crate::error::{PorterError, Result};
use crate::introspect::CanonicalModel;
use crate::models::{Family, Language, Method};
use crate::render::families::{self, Builder};
use crate::render::lang::{self, Printer};
use crate::render::RenderOptions;

/// Go covers the branch-and-kernel families only
const GO_FAMILIES: &[Family] = &[Family::DecisionTree, Family::TreeEnsemble, Family::Svm];

/// Supported families per language
static SUPPORT: &[(Language, &[Family])] = &[
    (Language::C, &Family::ALL),
    (Language::Go, GO_FAMILIES),
    (Language::Java, &Family::ALL),
    (Language::JavaScript, &Family::ALL),
    (Language::Php, &Family::ALL),
    (Language::Ruby, &Family::ALL),
];

/// A family builder bound to a language printer
#[derive(Clone, Copy)]
pub struct Renderer {
    family: Family,
    language: Language,
    build: Builder,
    print: Printer,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("family", &self.family)
            .field("language", &self.language)
            .finish()
    }
}

impl Renderer {
    /// Resolve the renderer for a pair, failing with `UnsupportedLanguage`
    pub fn lookup(family: Family, language: Language) -> Result<Self> {
        if !is_supported(family, language) {
            return Err(PorterError::UnsupportedLanguage {
                language: language.id().to_string(),
                family: Some(family),
            });
        }
        Ok(Self {
            family,
            language,
            build: families::builder(family),
            print: lang::printer(language),
        })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Render a model as self-contained source text
    ///
    /// Pure: no I/O, the same inputs always give the same text.
    pub fn render(
        &self,
        model: &CanonicalModel,
        method: Method,
        options: &RenderOptions,
    ) -> Result<String> {
        let program = (self.build)(model, method)?;
        options.validate(&program)?;
        Ok((self.print)(&program, options))
    }
}

pub fn is_supported(family: Family, language: Language) -> bool {
    SUPPORT
        .iter()
        .any(|(l, families)| *l == language && families.contains(&family))
}

/// Languages that can render a family
pub fn languages_for(family: Family) -> Vec<Language> {
    SUPPORT
        .iter()
        .filter(|(_, families)| families.contains(&family))
        .map(|(l, _)| *l)
        .collect()
}

/// Every supported pair, in table order
pub fn support_matrix() -> Vec<(Family, Language)> {
    SUPPORT
        .iter()
        .flat_map(|(l, families)| families.iter().map(move |f| (*f, *l)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_no_duplicates() {
        for (i, (a, families)) in SUPPORT.iter().enumerate() {
            assert!(
                SUPPORT[i + 1..].iter().all(|(b, _)| a != b),
                "language {} listed twice",
                a
            );
            for (j, f) in families.iter().enumerate() {
                assert!(!families[j + 1..].contains(f), "{} listed twice for {}", f, a);
            }
        }
    }

    #[test]
    fn test_every_family_and_language_reachable() {
        for family in Family::ALL {
            assert!(!languages_for(family).is_empty(), "{} has no language", family);
        }
        for language in Language::ALL {
            assert!(SUPPORT.iter().any(|(l, _)| *l == language));
        }
    }

    #[test]
    fn test_go_rejects_knn() {
        let err = Renderer::lookup(Family::Knn, Language::Go).unwrap_err();
        assert!(matches!(
            err,
            PorterError::UnsupportedLanguage { family: Some(Family::Knn), .. }
        ));
        assert!(Renderer::lookup(Family::Svm, Language::Go).is_ok());
    }

    #[test]
    fn test_support_matrix_size() {
        assert_eq!(support_matrix().len(), 5 * Family::ALL.len() + GO_FAMILIES.len());
    }
}
