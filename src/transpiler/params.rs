use serde::Serialize;

use crate::ast::Value;

/// Direction of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Input,
    /// Filled by the database (`RETURNING ... INTO`)
    Output,
}

/// A named parameter. The name is stored without the dialect prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub value: Value,
    pub direction: Direction,
}

/// Ordered parameter bag for one statement.
///
/// Names are unique ignoring ASCII case; a clashing base name gets a
/// numeric suffix (`age`, `age_1`, `age_2`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Params {
    entries: Vec<Param>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an input value, returning the unique name it was stored under.
    pub fn add(&mut self, base: &str, value: Value) -> String {
        let name = self.unique_name(base);
        self.entries.push(Param {
            name: name.clone(),
            value,
            direction: Direction::Input,
        });
        name
    }

    /// Declare an output parameter.
    pub fn add_output(&mut self, base: &str) -> String {
        let name = self.unique_name(base);
        self.entries.push(Param {
            name: name.clone(),
            value: Value::Null,
            direction: Direction::Output,
        });
        name
    }

    fn unique_name(&self, base: &str) -> String {
        let base = if base.is_empty() { "param" } else { base };
        if !self.contains(base) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| &p.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|p| p.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_names() {
        let mut p = Params::new();
        assert_eq!(p.add("age", Value::Int(1)), "age");
        assert_eq!(p.add("age", Value::Int(2)), "age_1");
        assert_eq!(p.add("AGE", Value::Int(3)), "AGE_2");
        assert_eq!(p.add("", Value::Null), "param");
        assert_eq!(p.len(), 4);
        assert_eq!(p.get("age_1"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let mut p = Params::new();
        p.add("id_1", Value::Int(0));
        p.add("id", Value::Int(1));
        assert_eq!(p.add("id", Value::Int(2)), "id_2");
    }

    #[test]
    fn test_output_param() {
        let mut p = Params::new();
        let name = p.add_output("out_id");
        let param = p.iter().find(|x| x.name == name).unwrap();
        assert_eq!(param.direction, Direction::Output);
    }
}
