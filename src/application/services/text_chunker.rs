use crate::domain::entities::Chunk;

pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 1000;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const JOIN_SEPARATOR: &str = " ";

/// Re-segments page-sized text chunks into pieces of roughly `max_length`
/// characters, packing whole paragraphs greedily.
///
/// The limit is a soft ceiling: a paragraph is never split, so a single
/// paragraph longer than `max_length` is emitted whole.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_length: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

impl TextChunker {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn chunk_text(&self, chunks: &[Chunk]) -> Vec<Chunk> {
        chunks
            .iter()
            .flat_map(|chunk| {
                self.split_content(chunk.content())
                    .into_iter()
                    .map(move |content| chunk.derive(content))
            })
            .collect()
    }

    pub fn split_content(&self, content: &str) -> Vec<String> {
        let parts = content
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty());

        let mut pieces = Vec::new();
        let mut buffer = String::new();
        // Tracked separately because `String::len` counts bytes.
        let mut buffer_chars = 0;

        for part in parts {
            let part_chars = part.chars().count();
            let projected = if buffer.is_empty() {
                part_chars
            } else {
                buffer_chars + JOIN_SEPARATOR.len() + part_chars
            };

            if projected < self.max_length {
                if !buffer.is_empty() {
                    buffer.push_str(JOIN_SEPARATOR);
                }
                buffer.push_str(part);
                buffer_chars = projected;
                continue;
            }

            if !buffer.is_empty() {
                pieces.push(std::mem::take(&mut buffer));
            }
            buffer.push_str(part);
            buffer_chars = part_chars;
        }

        if !buffer.is_empty() {
            pieces.push(buffer);
        }

        pieces
    }
}
