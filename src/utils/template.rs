//! Placeholder substitution for command templates.
//!
//! Substitution is a single left-to-right pass, so placeholder-looking text
//! inside a substituted value (a prompt mentioning `{model}`, say) is never
//! expanded a second time.

/// Replaces every occurrence of each `(placeholder, value)` pair in
/// `template`. Earlier pairs win when placeholders overlap.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    'scan: while !rest.is_empty() {
        for (placeholder, value) in vars {
            if placeholder.is_empty() {
                continue;
            }
            if let Some(after) = rest.strip_prefix(placeholder) {
                out.push_str(value);
                rest = after;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_substitution() {
        let rendered = render_template(
            "pytest {test_dir} --rootdir {workspace}",
            &[("{test_dir}", "/w/tests"), ("{workspace}", "/w")],
        );
        assert_eq!(rendered, "pytest /w/tests --rootdir /w");
    }

    #[test]
    fn test_repeated_placeholder() {
        assert_eq!(render_template("{a}-{a}", &[("{a}", "x")]), "x-x");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let rendered = render_template(
            "{prompt} --model {model}",
            &[("{prompt}", "use {model} wisely"), ("{model}", "o3")],
        );
        assert_eq!(rendered, "use {model} wisely --model o3");
    }

    #[test]
    fn test_unknown_placeholders_untouched() {
        assert_eq!(render_template("{other} ü", &[("{a}", "x")]), "{other} ü");
    }
}
