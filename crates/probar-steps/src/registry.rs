//! Step registry: phrase patterns bound to handlers.
//!
//! A pattern is literal text with `{placeholder}` slots:
//!
//! ```text
//! I set the "{element_name}" to "{text_string}"
//! ```
//!
//! Each slot matches any run of characters (possibly empty), lazily, and the
//! whole pattern is anchored at both ends. Captured values reach the handler
//! positionally as [`StepArgs`].
//!
//! When more than one pattern of the same kind matches a line, the one with
//! the most literal characters wins; ties go to the earliest registration.

use crate::context::StepContext;
use crate::driver::WebDriver;
use crate::result::{StepError, StepResult};
use futures::future::BoxFuture;
use regex::Regex;
use std::fmt;
use tracing::Instrument;

/// Gherkin keyword a step is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Precondition
    Given,
    /// Action
    When,
    /// Outcome
    Then,
}

impl StepKind {
    /// Keyword as written in a scenario
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Values captured from a step line, in placeholder order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs(Vec<String>);

impl StepArgs {
    /// Wrap captured values
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// Argument at `index`
    pub fn get(&self, index: usize) -> StepResult<&str> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or(StepError::MissingArgument { index })
    }

    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the step captured nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Future returned by a step handler
pub type StepFuture<'a> = BoxFuture<'a, StepResult<()>>;

/// Step handler
pub type StepFn<D> = for<'a> fn(&'a mut StepContext<D>, StepArgs) -> StepFuture<'a>;

// =============================================================================
// PATTERN
// =============================================================================

/// Compiled phrase template
#[derive(Debug, Clone)]
pub struct StepPattern {
    template: String,
    regex: Regex,
    placeholders: Vec<String>,
    literal_len: usize,
}

impl StepPattern {
    /// Compile a template
    pub fn compile(template: &str) -> StepResult<Self> {
        let invalid = |message: &str| StepError::InvalidPattern {
            pattern: template.to_string(),
            message: message.to_string(),
        };

        let mut source = String::from("^");
        let mut placeholders = Vec::new();
        let mut literal_len = 0;
        let mut rest = template;

        while let Some(open) = rest.find(['{', '}']) {
            let (literal, tail) = rest.split_at(open);
            if tail.starts_with('}') {
                return Err(invalid("unmatched '}'"));
            }
            let close = tail.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
            let name = &tail[1..close];
            if !is_identifier(name) {
                return Err(invalid("placeholder names must be identifiers"));
            }
            if placeholders.iter().any(|p| p == name) {
                return Err(invalid("duplicate placeholder"));
            }
            source.push_str(&regex::escape(literal));
            source.push_str("(.*?)");
            literal_len += literal.chars().count();
            placeholders.push(name.to_string());
            rest = &tail[close + 1..];
        }
        source.push_str(&regex::escape(rest));
        source.push('$');
        literal_len += rest.chars().count();

        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            regex,
            placeholders,
            literal_len,
        })
    }

    /// Template text
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order
    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Number of literal characters; higher is more specific
    #[must_use]
    pub const fn specificity(&self) -> usize {
        self.literal_len
    }

    /// Match a step line, returning captured arguments
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<StepArgs> {
        self.regex.captures(text).map(|caps| {
            StepArgs::new(
                caps.iter()
                    .skip(1)
                    .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect(),
            )
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// =============================================================================
// REGISTRY
// =============================================================================

/// A registered step
pub struct StepDefinition<D: WebDriver> {
    kind: StepKind,
    pattern: StepPattern,
    handler: StepFn<D>,
}

impl<D: WebDriver> StepDefinition<D> {
    /// Keyword
    pub const fn kind(&self) -> StepKind {
        self.kind
    }

    /// Compiled pattern
    pub const fn pattern(&self) -> &StepPattern {
        &self.pattern
    }
}

impl<D: WebDriver> fmt::Debug for StepDefinition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("kind", &self.kind)
            .field("template", &self.pattern.template)
            .finish_non_exhaustive()
    }
}

/// A step line resolved to its definition
#[derive(Debug)]
pub struct StepMatch<'r, D: WebDriver> {
    /// Matched definition
    pub definition: &'r StepDefinition<D>,
    /// Captured arguments
    pub args: StepArgs,
}

/// Ordered collection of step definitions
#[derive(Debug)]
pub struct StepRegistry<D: WebDriver> {
    steps: Vec<StepDefinition<D>>,
}

impl<D: WebDriver> Default for StepRegistry<D> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<D: WebDriver> StepRegistry<D> {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Fails if the template does not compile or the
    /// same kind and template are already registered.
    pub fn register(
        &mut self,
        kind: StepKind,
        template: &str,
        handler: StepFn<D>,
    ) -> StepResult<&mut Self> {
        if self
            .steps
            .iter()
            .any(|s| s.kind == kind && s.pattern.template == template)
        {
            return Err(StepError::InvalidPattern {
                pattern: template.to_string(),
                message: format!("already registered as a {kind} step"),
            });
        }
        let pattern = StepPattern::compile(template)?;
        self.steps.push(StepDefinition {
            kind,
            pattern,
            handler,
        });
        Ok(self)
    }

    /// Register a `Given` step
    pub fn given(&mut self, template: &str, handler: StepFn<D>) -> StepResult<&mut Self> {
        self.register(StepKind::Given, template, handler)
    }

    /// Register a `When` step
    pub fn when(&mut self, template: &str, handler: StepFn<D>) -> StepResult<&mut Self> {
        self.register(StepKind::When, template, handler)
    }

    /// Register a `Then` step
    pub fn then(&mut self, template: &str, handler: StepFn<D>) -> StepResult<&mut Self> {
        self.register(StepKind::Then, template, handler)
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &StepDefinition<D>> {
        self.steps.iter()
    }

    /// `"Kind template"` for every definition, for listing available steps
    pub fn catalog(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| format!("{} {}", s.kind, s.pattern.template))
            .collect()
    }

    /// Resolve a step line to the most specific matching definition
    pub fn find(&self, kind: StepKind, text: &str) -> StepResult<StepMatch<'_, D>> {
        let mut best: Option<StepMatch<'_, D>> = None;
        for definition in self.steps.iter().filter(|s| s.kind == kind) {
            let Some(args) = definition.pattern.captures(text) else {
                continue;
            };
            let better = best.as_ref().map_or(true, |b| {
                definition.pattern.specificity() > b.definition.pattern.specificity()
            });
            if better {
                best = Some(StepMatch { definition, args });
            }
        }
        best.ok_or_else(|| StepError::UndefinedStep {
            kind: kind.to_string(),
            text: text.to_string(),
        })
    }

    /// Resolve and run one step line against the scenario context
    pub async fn run(
        &self,
        ctx: &mut StepContext<D>,
        kind: StepKind,
        text: &str,
    ) -> StepResult<()> {
        let StepMatch { definition, args } = self.find(kind, text)?;
        let span = tracing::info_span!("step", %kind, text);
        async {
            tracing::debug!(pattern = definition.pattern.template(), ?args, "running step");
            let result = (definition.handler)(ctx, args).await;
            if let Err(ref err) = result {
                tracing::debug!(error = %err, kind = ?err.kind(), "step failed");
            }
            result
        }
        .instrument(span)
        .await
    }
}
