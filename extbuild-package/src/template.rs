//! `$name` / `${name}` placeholder substitution for the installer manifest.
//!
//! `$$` is a literal dollar. Any other `$` that does not start a valid
//! placeholder, or a placeholder with no value, is a format error.

use extbuild_types::{BuildError, BuildResult};
use std::collections::BTreeMap;

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> BuildResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if after.starts_with('$') {
            out.push('$');
            rest = &after[1..];
            continue;
        } else if let Some(braced) = after.strip_prefix('{') {
            let end = braced.find('}').ok_or_else(|| unterminated(template, pos))?;
            let name = &braced[..end];
            if !name.starts_with(is_ident_start) || !name.chars().all(is_ident_char) {
                return Err(invalid(template, pos));
            }
            (name, end + 2)
        } else if after.starts_with(is_ident_start) {
            let len = after.find(|c: char| !is_ident_char(c)).unwrap_or(after.len());
            (&after[..len], len)
        } else {
            return Err(invalid(template, pos));
        };

        let value = values.get(name).ok_or_else(|| {
            BuildError::format(format!("manifest template has no value for placeholder '{name}'"))
        })?;
        out.push_str(value);
        rest = &after[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

fn line_of(template: &str, byte: usize) -> usize {
    template[..byte].matches('\n').count() + 1
}

fn invalid(template: &str, byte: usize) -> BuildError {
    BuildError::format(format!(
        "invalid placeholder in manifest template at line {}",
        line_of(template, byte)
    ))
}

fn unterminated(template: &str, byte: usize) -> BuildError {
    BuildError::format(format!(
        "unterminated placeholder in manifest template at line {}",
        line_of(template, byte)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_bare_and_braced() {
        let rendered = render_template(
            "<em:version>$version</em:version><em:name>${name}</em:name>",
            &values(&[("version", "4.3.1"), ("name", "Spectral")]),
        )
        .unwrap();
        assert_eq!(
            rendered,
            "<em:version>4.3.1</em:version><em:name>Spectral</em:name>"
        );
        assert!(!rendered.contains('$'));
    }

    #[test]
    fn bare_name_stops_at_non_identifier() {
        let rendered =
            render_template("v$version.x ${name}s", &values(&[("version", "1"), ("name", "n")]))
                .unwrap();
        assert_eq!(rendered, "v1.x ns");
    }

    #[test]
    fn double_dollar_is_literal() {
        let rendered = render_template("cost: $$5 $a", &values(&[("a", "x")])).unwrap();
        assert_eq!(rendered, "cost: $5 x");
    }

    #[test]
    fn missing_value_is_a_format_error() {
        let err = render_template("$version $missing", &values(&[("version", "1")])).unwrap_err();
        assert!(matches!(err, BuildError::Format(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn malformed_placeholders_are_rejected() {
        let v = values(&[("a", "x")]);
        for bad in ["$ a", "${a", "${1a}", "${}", "end$"] {
            let err = render_template(bad, &v).unwrap_err();
            assert!(matches!(err, BuildError::Format(_)), "{bad}");
        }
    }

    #[test]
    fn replacement_values_are_not_rescanned() {
        let rendered = render_template("$a", &values(&[("a", "$b")])).unwrap();
        assert_eq!(rendered, "$b");
    }
}
