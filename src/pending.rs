// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Skeletons of step definitions for pending steps.

use inflector::Inflector as _;

use crate::{
    keywords::{keys, Keywords, StartingWordNotFound, StepType},
    step::PendingStep,
};

/// Characters dropped from generated method names.
const NAME_PUNCTUATION: &[char] =
    &['\'', '"', '.', ',', ';', ':', '!', '|', '<', '>', '*'];

/// Generator of step definition skeletons for [`PendingStep`]s.
///
/// ```rust
/// # use stepwise::{keywords::Keywords, pending::PendingStepMethodGenerator, step::PendingStep};
/// let generator = PendingStepMethodGenerator::new(Keywords::default());
/// let pending = PendingStep::new("When I am pending", None);
///
/// assert_eq!(generator.method_name(&pending).unwrap(), "whenIAmPending");
/// ```
#[derive(Clone, Debug, Default)]
pub struct PendingStepMethodGenerator {
    keywords: Keywords,
}

impl PendingStepMethodGenerator {
    /// Creates a generator speaking the `keywords`.
    #[must_use]
    pub const fn new(keywords: Keywords) -> Self {
        Self { keywords }
    }

    /// [`StepType`] of the `step`, the one of its previous non-`And` step for
    /// an `And` step.
    ///
    /// # Errors
    ///
    /// If the type cannot be resolved from starting words.
    pub fn step_type(&self, step: &PendingStep) -> Result<StepType, StartingWordNotFound> {
        let text = step.step_as_string();
        if self.keywords.is_and_step(text) {
            let previous = step.previous_non_and_step().ok_or_else(|| {
                StartingWordNotFound::for_step(
                    text,
                    self.keywords.starting_words(StepType::And).unwrap_or_default(),
                )
            })?;
            self.keywords.step_type_for(previous)
        } else {
            self.keywords.step_type_for(text)
        }
    }

    /// Pattern of the `step`: its text without the starting word.
    ///
    /// # Errors
    ///
    /// If the `step` starts with no known starting word.
    pub fn pattern<'s>(
        &self,
        step: &'s PendingStep,
    ) -> Result<&'s str, StartingWordNotFound> {
        let text = step.step_as_string();
        let step_type = self.keywords.step_type_for(text)?;
        self.keywords.step_without_starting_word(text, step_type)
    }

    /// Method name of the `step`: its lowercase step type followed by its
    /// pattern in camel case, without punctuation.
    ///
    /// # Errors
    ///
    /// See [`PendingStepMethodGenerator::step_type()`].
    pub fn method_name(&self, step: &PendingStep) -> Result<String, StartingWordNotFound> {
        let step_type = self.step_type(step)?;
        let pattern = self
            .pattern(step)?
            .replace(NAME_PUNCTUATION, "");
        Ok(format!("{} {pattern}", type_name(step_type)).to_camel_case())
    }

    /// Generates the source of a pending step definition matching the
    /// `step`.
    ///
    /// # Errors
    ///
    /// If the step type or pattern cannot be resolved from starting words.
    pub fn generate_method(&self, step: &PendingStep) -> Result<String, StartingWordNotFound> {
        let step_type = self.step_type(step)?;
        let pattern = self.pattern(step)?;
        let method = self.method_name(step)?;
        Ok(format!(
            "// {pending}\n\
             steps.{ty}_with(\n    \
                 {pattern:?},\n    \
                 StepOptions::new().pending().method({method:?}),\n    \
                 |_: &mut S| {{}},\n\
             );\n",
            pending = self.keywords.word(keys::PENDING),
            ty = type_name(step_type),
        ))
    }
}

fn type_name(step_type: StepType) -> &'static str {
    match step_type {
        StepType::Given => "given",
        StepType::When => "when",
        StepType::Then => "then",
        StepType::And => "and",
        StepType::Ignorable => "ignorable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> PendingStepMethodGenerator {
        PendingStepMethodGenerator::new(Keywords::default())
    }

    #[test]
    fn generates_method_for_pending_step() {
        let pending = PendingStep::new("When I am pending", None);

        let method = generator().generate_method(&pending).unwrap();

        assert_eq!(
            method,
            "// PENDING\n\
             steps.when_with(\n    \
                 \"I am pending\",\n    \
                 StepOptions::new().pending().method(\"whenIAmPending\"),\n    \
                 |_: &mut S| {},\n\
             );\n",
        );
    }

    #[test]
    fn resolves_and_steps_by_previous_step() {
        let pending =
            PendingStep::new("And I am pending", Some("Given I am fine".into()));

        let generator = generator();

        assert_eq!(generator.step_type(&pending).unwrap(), StepType::Given);
        assert_eq!(generator.pattern(&pending).unwrap(), "I am pending");
        assert_eq!(generator.method_name(&pending).unwrap(), "givenIAmPending");
    }

    #[test]
    fn drops_punctuation_from_method_names() {
        let pending = PendingStep::new("Then the <item>'s price is \"high\"!", None);

        assert_eq!(
            generator().method_name(&pending).unwrap(),
            "thenTheItemsPriceIsHigh",
        );
    }

    #[test]
    fn escapes_patterns() {
        let pending = PendingStep::new("Given a \"quoted\" name", None);

        let method = generator().generate_method(&pending).unwrap();

        assert!(method.contains(r#""a \"quoted\" name","#));
    }

    #[test]
    fn fails_on_and_step_without_previous_step() {
        let pending = PendingStep::new("And I am pending", None);

        assert!(generator().generate_method(&pending).is_err());
    }
}
