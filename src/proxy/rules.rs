use crate::config::types::RuleSpec;
use crate::error::{ProxyError, ProxyResult};
use log::trace;
use regex::Regex;

/// A compiled `(pattern, replacement)` pair
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

/// Ordered, immutable collection of rewrite rules; first match wins
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RewriteRule {
    /// Compile a single rule. Replacement templates may use `$1`, `$&` or `${name}`.
    pub fn new(pattern: &str, replacement: &str) -> ProxyResult<Self> {
        let compiled = Regex::new(pattern).map_err(|source| ProxyError::MalformedRule { pattern: pattern.to_string(), source })?;
        Ok(Self { pattern: compiled, replacement: normalize_template(replacement) })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.pattern.is_match(input)
    }

    /// Replace the first occurrence of the pattern in `input`
    pub fn apply(&self, input: &str) -> String {
        self.pattern.replace(input, self.replacement.as_str()).into_owned()
    }
}

impl RuleSet {
    pub fn compile(specs: &[RuleSpec]) -> ProxyResult<Self> {
        let rules = specs.iter().map(|spec| RewriteRule::new(&spec.pattern, &spec.replacement)).collect::<ProxyResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rewrite(&self, input: &str) -> String {
        rewrite(input, &self.rules)
    }
}

/// Rewrite `input` with the first matching rule, or return it unchanged when none match
pub fn rewrite(input: &str, rules: &[RewriteRule]) -> String {
    for rule in rules {
        if rule.is_match(input) {
            let output = rule.apply(input);
            trace!("Rewrite rule '{}' matched {:?} -> {:?}", rule.pattern(), input, output);
            return output;
        }
    }
    input.to_string()
}

// `$1abc` would be read by the regex crate as a group named `1abc`, so numbered
// references are braced. `$&` is the whole match and `$<name>` a named group.
// Any other `$` (including `$0` and a bare `$name`) stays literal.
fn normalize_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (emitted, consumed) = match after.as_bytes().first() {
            Some(b'$') => ("$$".to_string(), 1),
            Some(b'&') => ("${0}".to_string(), 1),
            Some(b'{') => ("$".to_string(), 0),
            Some(b'1'..=b'9') => {
                let n = after.bytes().take_while(u8::is_ascii_digit).count();
                (format!("${{{}}}", &after[..n]), n)
            }
            Some(b'<') => match after.find('>') {
                Some(end) if end > 1 && after[1..end].bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') => {
                    (format!("${{{}}}", &after[1..end]), end + 1)
                }
                _ => ("$$".to_string(), 0),
            },
            _ => ("$$".to_string(), 0),
        };
        out.push_str(&emitted);
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}
