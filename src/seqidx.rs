use rustc_hash::FxHashMap;

/// Interns sequence (chromosome) names into dense `u32` ids.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SequenceIndex {
    name_to_id: FxHashMap<String, u32>,
    id_to_name: Vec<String>,
}

impl SequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from names listed in id order.
    pub fn from_names(names: Vec<String>) -> Self {
        let mut index = Self::new();
        for name in &names {
            index.get_or_insert_id(name);
        }
        index
    }

    pub fn get_or_insert_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.id_to_name.len() as u32;
        self.name_to_id.insert(name.to_owned(), id);
        self.id_to_name.push(name.to_owned());
        id
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_name(&self, id: u32) -> Option<&str> {
        self.id_to_name.get(id as usize).map(String::as_str)
    }

    /// Names in id order.
    pub fn names(&self) -> &[String] {
        &self.id_to_name
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut index = SequenceIndex::new();
        assert_eq!(index.get_or_insert_id("CHR1"), 0);
        assert_eq!(index.get_or_insert_id("CHR2"), 1);
        assert_eq!(index.get_or_insert_id("CHR1"), 0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get_name(1), Some("CHR2"));
        assert_eq!(index.get_id("CHR3"), None);

        let rebuilt = SequenceIndex::from_names(index.names().to_vec());
        assert_eq!(rebuilt, index);
    }
}
