//! Stable chunk identity: `source:page:chunk_index`

use crate::corpus::Chunk;

/// Assign `chunk_index` and `id` to chunks in chunker order
///
/// The index resets to 0 whenever `source:page` differs from the previous
/// chunk. Chunks must stay grouped by source and page as the chunker emits
/// them; reordering changes the ids.
pub fn assign_chunk_ids(chunks: &mut [Chunk]) {
    let mut last_page_key: Option<String> = None;
    let mut current_index = 0u32;

    for chunk in chunks.iter_mut() {
        let page_key = chunk.page_key();

        if last_page_key.as_deref() == Some(page_key.as_str()) {
            current_index += 1;
        } else {
            current_index = 0;
        }

        chunk.chunk_index = current_index;
        chunk.id = format!("{}:{}", page_key, current_index);
        last_page_key = Some(page_key);
    }
}
