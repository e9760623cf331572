/// Per-dialect lexical rules.
///
/// Whether columns are alias-qualified is not part of the option; every
/// fragment builder receives it explicitly through `BuildContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderOption {
    pub open_quote: &'static str,
    pub close_quote: &'static str,
    pub param_prefix: char,
}

impl ProviderOption {
    pub const fn new(open_quote: &'static str, close_quote: &'static str, param_prefix: char) -> Self {
        Self {
            open_quote,
            close_quote,
            param_prefix,
        }
    }

    /// Quote an identifier (table, column or alias). A close quote inside the
    /// name is doubled.
    pub fn combine_field_name(&self, name: &str) -> String {
        let escaped = name.replace(self.close_quote, &self.close_quote.repeat(2));
        format!("{}{}{}", self.open_quote, escaped, self.close_quote)
    }

    /// Placeholder text for a parameter name.
    pub fn placeholder(&self, name: &str) -> String {
        format!("{}{}", self.param_prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_and_placeholder() {
        let mssql = ProviderOption::new("[", "]", '@');
        assert_eq!(mssql.combine_field_name("user_name"), "[user_name]");
        assert_eq!(mssql.placeholder("id"), "@id");

        let oracle = ProviderOption::new("\"", "\"", ':');
        assert_eq!(oracle.combine_field_name("ID"), "\"ID\"");
        assert_eq!(oracle.placeholder("id"), ":id");
    }

    #[test]
    fn test_close_quote_is_doubled() {
        let mysql = ProviderOption::new("`", "`", '@');
        assert_eq!(mysql.combine_field_name("we`ird"), "`we``ird`");

        let mssql = ProviderOption::new("[", "]", '@');
        assert_eq!(mssql.combine_field_name("a]b[c"), "[a]]b[c]");

        let oracle = ProviderOption::new("\"", "\"", ':');
        assert_eq!(oracle.combine_field_name("i\"d"), "\"i\"\"d\"");
    }
}
