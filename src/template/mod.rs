//! String templating: `$(scope.key)` placeholders and `{token}` rename/URL templates

pub mod placeholder;
pub mod rename;

pub use placeholder::{
    DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER, ResolveContext, Resolver, Scope,
    ScopeProvider, UnresolvedPlaceholder,
};
pub use rename::{UrlRewriter, expand_request_tokens, rename};

use regex::{Captures, Regex};
use std::sync::LazyLock;

static BRACE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("brace token pattern is valid"));

/// Replace every `{token}` for which `lookup` has a value, in a single pass.
///
/// Underscores inside the braces are ignored, so `{file_name}` and `{filename}`
/// name the same token. Tokens without a value are kept verbatim, and replaced
/// text is never scanned again.
pub fn replace_brace_tokens<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    BRACE_TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            let token = caps[1].replace('_', "");
            lookup(&token).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
