//! Ordered header multi-map.
//!
//! Names are case-insensitive and stored lowercase. Entries keep the order in
//! which a name was first added; values of one name keep their insertion
//! order. Nothing is validated on insert, so a `Header` can hold names or
//! values that will later be rejected when the request is built.

use http::HeaderMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    entries: Vec<(String, Vec<String>)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the values of `name`.
    pub fn add(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let value = value.into();
        match self.position(name.as_ref()) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((name.as_ref().to_ascii_lowercase(), vec![value])),
        }
    }

    /// Replace every value of `name` with `value`.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let value = value.into();
        match self.position(name.as_ref()) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((name.as_ref().to_ascii_lowercase(), vec![value])),
        }
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(i) => &self.entries[i].1,
            None => &[],
        }
    }

    /// Remove `name`, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut header = Header::new();
        for (name, value) in iter {
            header.add(name, value);
        }
        header
    }
}

impl From<&HeaderMap> for Header {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let mut header = Header::new();
        header.add("Content-Type", "application/json");
        assert_eq!(header.get("content-type"), Some("application/json"));
        assert_eq!(header.get("CONTENT-TYPE"), Some("application/json"));
        assert!(header.contains("Content-type"));
    }

    #[test]
    fn add_appends_and_set_replaces() {
        let mut header = Header::new();
        header.add("Accept", "text/html");
        header.add("accept", "application/json");
        assert_eq!(header.get_all("accept"), ["text/html", "application/json"]);

        header.set("ACCEPT", "*/*");
        assert_eq!(header.get_all("accept"), ["*/*"]);
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn iteration_keeps_first_insertion_order() {
        let header: Header = [("x-b", "1"), ("x-a", "2"), ("X-B", "3")]
            .into_iter()
            .collect();
        let names: Vec<&str> = header.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["x-b", "x-a"]);
        assert_eq!(header.get_all("x-b"), ["1", "3"]);
    }

    #[test]
    fn remove_returns_values() {
        let mut header: Header = [("x-one", "1")].into_iter().collect();
        assert_eq!(header.remove("X-One"), Some(vec!["1".to_string()]));
        assert!(header.is_empty());
        assert_eq!(header.remove("x-one"), None);
    }

    #[test]
    fn converts_from_header_map_keeping_repeated_values() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", "a=1".parse().unwrap());
        map.append("set-cookie", "b=2".parse().unwrap());
        map.insert("content-length", "2".parse().unwrap());

        let header = Header::from(&map);
        assert_eq!(header.get_all("Set-Cookie"), ["a=1", "b=2"]);
        assert_eq!(header.get("content-length"), Some("2"));
    }
}
