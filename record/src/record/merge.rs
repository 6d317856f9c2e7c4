use std::sync::Arc;

use super::Record;

/// Combine the local record with the record a server response carried
///
/// The server owns `params`, `errors` and `base_error`. `populated` is
/// additive: local entries the response did not echo are kept, and server
/// entries win on collisions. `id` and `title` fall back to the local values
/// when the server omits them.
#[must_use]
pub fn merge(previous: &Record, server_record: Record) -> Record {
    let populated = if server_record.populated.is_empty() {
        Arc::clone(&previous.populated)
    } else {
        let mut combined = (*previous.populated).clone();
        combined.extend(
            server_record
                .populated
                .iter()
                .map(|(path, record)| (path.clone(), record.clone())),
        );
        Arc::new(combined)
    };

    Record {
        id: server_record.id.or_else(|| previous.id.clone()),
        title: server_record.title.or_else(|| previous.title.clone()),
        params: server_record.params,
        errors: server_record.errors,
        populated,
        base_error: server_record.base_error,
    }
}
