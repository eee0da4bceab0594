//! Creation of symbols from compact name strings.
//!
//! Names are separated by commas or whitespace. A name ending in a numeric
//! range such as `q1:4` expands to `q1, q2, q3`.

use crate::Expr;

/// Expands a compact name string into individual names.
pub fn expand_names(names: &str) -> Vec<String> {
    names
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .flat_map(expand_range)
        .collect()
}

fn expand_range(name: &str) -> Vec<String> {
    let Some((head, end)) = name.split_once(':') else {
        return vec![name.to_string()];
    };
    let digits = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    match (digits, end.parse::<usize>()) {
        (Some(i), Ok(end)) => {
            let (prefix, start) = head.split_at(i);
            match start.parse::<usize>() {
                Ok(start) => (start..end).map(|k| format!("{prefix}{k}")).collect(),
                Err(_) => vec![name.to_string()],
            }
        }
        _ => vec![name.to_string()],
    }
}

/// Creates constant symbols from a compact name string.
pub fn symbols(names: &str) -> Vec<Expr> {
    expand_names(names).iter().map(|n| Expr::symbol(n)).collect()
}

/// Creates time-dependent symbols from a compact name string.
pub fn dynamicsymbols(names: &str) -> Vec<Expr> {
    expand_names(names).iter().map(|n| Expr::dynamic(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_expand() {
        assert_eq!(expand_names("q1:4"), vec!["q1", "q2", "q3"]);
        assert_eq!(expand_names("r, m ixx"), vec!["r", "m", "ixx"]);
        assert_eq!(expand_names("disc_u3:6").len(), 3);
    }

    #[test]
    fn symbols_have_the_expanded_names() {
        let q = dynamicsymbols("q1:3");
        assert_eq!(q[1], Expr::dynamic("q2"));
        assert_eq!(symbols("r")[0].name(), Some("r"));
    }
}
