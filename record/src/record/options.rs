use super::Record;
use crate::flat;

/// Options applied whenever a record snapshot is taken in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// Restrict `params` to these property paths (and everything beneath them)
    pub include_params: Option<Vec<String>>,
}

impl RecordOptions {
    /// Only keep the given property paths in `params`
    #[must_use]
    pub fn include_params<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_params = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Apply the params filter, if any
    #[must_use]
    pub fn filter(&self, record: Record) -> Record {
        match &self.include_params {
            Some(properties) => Record {
                params: flat::select_params(&record.params, properties.as_slice()),
                ..record
            },
            None => record,
        }
    }
}
