use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use log::warn;
use unic_langid::{langid, LanguageIdentifier};

use super::error::LocalizationError;

pub const AVAILABLE_LANGUAGES: &[(LanguageIdentifier, &str)] =
    &[(langid!("en-US"), include_str!("localization/en.ftl"))];

pub fn create_fluent_bundle(
    desired_languages: &[LanguageIdentifier],
) -> Result<FluentBundle<FluentResource>, LocalizationError> {
    let mut bundle = FluentBundle::new(desired_languages.to_vec());
    // no bidi isolation marks around placeables
    bundle.set_use_isolating(false);

    for l in desired_languages.iter().rev() {
        let Some((_, s)) = AVAILABLE_LANGUAGES.iter().find(|e| e.0 == *l) else {
            return Err(LocalizationError::UnsupportedLanguage(l.to_string()));
        };
        let resource = FluentResource::try_new((*s).to_owned()).map_err(|(_, e)| {
            LocalizationError::Resource {
                language: l.to_string(),
                message: format!("{:?}", e),
            }
        })?;
        bundle.add_resource_overriding(resource);
    }

    Ok(bundle)
}

/// Message lookup used wherever a diagram shows a fixed label.
pub struct Localizer {
    bundle: FluentBundle<FluentResource>,
}

impl Localizer {
    pub fn new(desired_languages: &[LanguageIdentifier]) -> Result<Self, LocalizationError> {
        Ok(Self {
            bundle: create_fluent_bundle(desired_languages)?,
        })
    }

    pub fn for_tag(tag: &str) -> Result<Self, LocalizationError> {
        let language: LanguageIdentifier = tag
            .parse()
            .map_err(|_| LocalizationError::InvalidLanguageTag(tag.to_owned()))?;
        Self::new(&[language])
    }

    /// Translation of `id`, or `id` itself when there is none.
    pub fn gettext(&self, id: &str) -> String {
        self.lookup(id, None).unwrap_or_else(|| {
            warn!(id:% = id; "Missing message");
            id.to_owned()
        })
    }

    pub fn gettext_or(&self, id: &str, fallback: &str) -> String {
        self.lookup(id, None).unwrap_or_else(|| fallback.to_owned())
    }

    pub fn gettext_args(&self, id: &str, args: &[(&str, &str)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (k, v) in args {
            fluent_args.set(*k, *v);
        }
        self.lookup(id, Some(&fluent_args)).unwrap_or_else(|| {
            warn!(id:% = id; "Missing message");
            id.to_owned()
        })
    }

    fn lookup(&self, id: &str, args: Option<&FluentArgs>) -> Option<String> {
        let pattern = self.bundle.get_message(id)?.value()?;
        let mut errors = vec![];
        let value = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(id:% = id, errors:? = errors; "Formatting message failed");
        }
        Some(value.into_owned())
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new(&[langid!("en-US")]).unwrap_or_else(|e| {
            warn!(error:% = e; "Falling back to untranslated labels");
            let mut bundle = FluentBundle::new(vec![langid!("en-US")]);
            bundle.set_use_isolating(false);
            Self { bundle }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message() {
        let l = Localizer::default();
        assert_eq!(l.gettext("basic-event"), "Basic Event");
        assert_eq!(l.gettext("stereotype-profile"), "profile");
    }

    #[test]
    fn message_with_arguments_has_no_isolation_marks() {
        let l = Localizer::default();
        assert_eq!(
            l.gettext_args("from-package", &[("namespace", "Vehicles")]),
            "(from Vehicles)"
        );
    }

    #[test]
    fn unknown_message_falls_back() {
        let l = Localizer::default();
        assert_eq!(l.gettext("no-such-message"), "no-such-message");
        assert_eq!(l.gettext_or("c4-type-queue", "Queue"), "Queue");
    }

    #[test]
    fn language_selection_errors() {
        assert!(Localizer::for_tag("en-US").is_ok());
        assert_eq!(
            Localizer::for_tag("cs-CZ").err(),
            Some(LocalizationError::UnsupportedLanguage("cs-CZ".to_owned()))
        );
        assert_eq!(
            Localizer::for_tag("not a tag").err(),
            Some(LocalizationError::InvalidLanguageTag("not a tag".to_owned()))
        );
    }
}
