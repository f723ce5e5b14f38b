use crate::SelectError;

const WILDCARD: &str = "*";

/// Parsed `*` / `name` / `-name` column directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    wildcard: bool,
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl Selection {
    /// Validate `directives` against the input's `columns`.
    ///
    /// A directive naming an existing column is an include even when it
    /// starts with `-`. Per-directive errors are reported in directive
    /// order; combination errors are checked afterwards.
    pub fn parse<S: AsRef<str>>(directives: &[S], columns: &[&str]) -> Result<Self, SelectError> {
        let exists = |name: &str| columns.iter().any(|column| *column == name);
        let mut selection = Self::default();

        for directive in directives {
            let directive = directive.as_ref();
            if directive == WILDCARD {
                if selection.wildcard {
                    return Err(SelectError::RepeatedWildcard);
                }
                selection.wildcard = true;
            } else if exists(directive) {
                if selection.includes.iter().any(|name| name == directive) {
                    return Err(SelectError::RepeatedColumn(directive.to_owned()));
                }
                selection.includes.push(directive.to_owned());
            } else if let Some(name) = directive.strip_prefix('-').filter(|name| exists(*name)) {
                if selection.excludes.iter().any(|seen| seen == name) {
                    return Err(SelectError::RepeatedColumn(directive.to_owned()));
                }
                selection.excludes.push(name.to_owned());
            } else {
                return Err(SelectError::UnknownColumn(directive.to_owned()));
            }
        }

        if let Some(name) = selection
            .includes
            .iter()
            .find(|name| selection.excludes.contains(name))
        {
            return Err(SelectError::OverlappingIncludeExclude(name.clone()));
        }
        if !selection.excludes.is_empty() && !selection.wildcard {
            return Err(SelectError::ExcludeWithoutWildcard);
        }
        if selection.wildcard && !selection.includes.is_empty() {
            return Err(SelectError::WildcardWithIncludes);
        }

        Ok(selection)
    }

    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    #[must_use]
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    #[must_use]
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Base output columns: all of `columns` minus excludes under a
    /// wildcard, otherwise the includes in directive order.
    #[must_use]
    pub fn resolve(&self, columns: &[&str]) -> Vec<String> {
        if self.wildcard {
            columns
                .iter()
                .filter(|column| !self.excludes.iter().any(|name| name == **column))
                .map(|column| (*column).to_owned())
                .collect()
        } else {
            self.includes.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::Selection;
    use crate::SelectError;

    const COLUMNS: &[&str] = &["x", "y", "z"];

    fn parse(directives: &[&str]) -> Result<Selection, SelectError> {
        Selection::parse(directives, COLUMNS)
    }

    #[test]
    fn wildcard_keeps_input_order_minus_excludes() {
        let selection = parse(&["-y", "*"]).expect("valid");
        assert_eq!(selection.resolve(COLUMNS), ["x", "z"]);
    }

    #[test]
    fn includes_keep_directive_order() {
        let selection = parse(&["z", "x"]).expect("valid");
        assert_eq!(selection.resolve(COLUMNS), ["z", "x"]);
        assert!(parse(&[]).expect("valid").resolve(COLUMNS).is_empty());
    }

    #[test]
    fn each_invalid_combination_has_its_own_error() {
        assert_eq!(parse(&["*", "*"]), Err(SelectError::RepeatedWildcard));
        assert_eq!(parse(&["w"]), Err(SelectError::UnknownColumn("w".to_owned())));
        assert_eq!(parse(&["-w"]), Err(SelectError::UnknownColumn("-w".to_owned())));
        assert_eq!(parse(&["-x"]), Err(SelectError::ExcludeWithoutWildcard));
        assert_eq!(parse(&["*", "x"]), Err(SelectError::WildcardWithIncludes));
        assert_eq!(
            parse(&["x", "-x"]),
            Err(SelectError::OverlappingIncludeExclude("x".to_owned()))
        );
        assert_eq!(parse(&["x", "x"]), Err(SelectError::RepeatedColumn("x".to_owned())));
        assert_eq!(
            parse(&["*", "-y", "-y"]),
            Err(SelectError::RepeatedColumn("-y".to_owned()))
        );
    }

    #[test]
    fn dash_prefixed_column_names_are_includes() {
        let columns = ["-a", "a"];
        let selection = Selection::parse(&["-a"], &columns).expect("valid");
        assert_eq!(selection.includes(), ["-a"]);
        assert!(selection.excludes().is_empty());
    }

    proptest! {
        #[test]
        fn wildcard_with_excludes_is_an_ordered_difference(
            keep in prop::collection::vec(any::<bool>(), 3),
        ) {
            let mut directives = vec!["*".to_owned()];
            directives.extend(
                COLUMNS
                    .iter()
                    .zip(&keep)
                    .filter(|(_, keep)| !**keep)
                    .map(|(column, _)| format!("-{column}")),
            );
            let selection = Selection::parse(&directives, COLUMNS).expect("valid");
            let expected: Vec<&str> = COLUMNS
                .iter()
                .zip(&keep)
                .filter(|(_, keep)| **keep)
                .map(|(column, _)| *column)
                .collect();
            prop_assert_eq!(selection.resolve(COLUMNS), expected);
        }
    }
}
