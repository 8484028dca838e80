/// Ordered `key → genre` rules matched by case-insensitive containment
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<(String, String)>,
}

impl RuleTable {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut table = Self::default();
        table.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        table
    }

    /// Insert or replace a rule; keys are stored lowercased
    pub fn insert(&mut self, key: impl AsRef<str>, genre: impl Into<String>) {
        let key = key.as_ref().trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        let genre = genre.into();

        match self.rules.iter_mut().find(|(k, _)| *k == key) {
            Some(rule) => rule.1 = genre,
            None => self.rules.push((key, genre)),
        }
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = (String, String)>) {
        for (key, genre) in rules {
            self.insert(key, genre);
        }
    }

    /// Genre of the longest key contained in `text`; earlier rules win ties
    pub fn lookup(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();

        self.rules
            .iter()
            .filter(|(key, _)| text.contains(key.as_str()))
            .fold(None::<&(String, String)>, |best, rule| match best {
                Some(b) if b.0.len() >= rule.0.len() => Some(b),
                _ => Some(rule),
            })
            .map(|(_, genre)| genre.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
