//! In-memory document used by tests. Applies batch requests the way the Docs API does
//! closely enough to check offsets, styles and links.

use super::model::{NamedStyle, Paragraph, Request};
use super::DocumentStore;
use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone)]
struct Para {
    text: Vec<u16>,
    style: NamedStyle,
    links: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    paras: Vec<Para>,
    pub batches: Vec<Vec<Request>>,
    pub fetches: usize,
    pub fail_updates: bool,
}

impl MemoryDocument {
    /// A fresh document: one empty paragraph.
    pub fn empty() -> Self {
        Self::with_paragraphs(&[])
    }

    /// Paragraphs given without their newline, followed by the trailing empty paragraph.
    pub fn with_paragraphs(lines: &[(&str, NamedStyle)]) -> Self {
        let mut doc = Self::ending_with(lines);
        doc.paras.push(Para {
            text: vec![b'\n' as u16],
            style: NamedStyle::NormalText,
            links: Vec::new(),
        });
        doc
    }

    /// Paragraphs given without their newline; the last one ends the body.
    pub fn ending_with(lines: &[(&str, NamedStyle)]) -> Self {
        let paras = lines
            .iter()
            .map(|(text, style)| Para {
                text: format!("{}\n", text).encode_utf16().collect(),
                style: *style,
                links: Vec::new(),
            })
            .collect();
        Self {
            paras,
            batches: Vec::new(),
            fetches: 0,
            fail_updates: false,
        }
    }

    pub fn paragraphs(&self) -> Vec<Paragraph> {
        let mut start = 1;
        self.paras
            .iter()
            .map(|p| {
                let end = start + p.text.len();
                let para = Paragraph {
                    start,
                    end,
                    text: String::from_utf16_lossy(&p.text),
                    style: p.style,
                    links: p.links.clone(),
                };
                start = end;
                para
            })
            .collect()
    }

    /// (trimmed text, style) per paragraph, trailing empty paragraph excluded.
    pub fn outline(&self) -> Vec<(String, NamedStyle)> {
        let mut all: Vec<_> = self
            .paragraphs()
            .into_iter()
            .map(|p| (p.text.trim().to_string(), p.style))
            .collect();
        all.pop();
        all
    }

    fn locate(&self, index: usize) -> Result<(usize, usize)> {
        let mut start = 1;
        for (i, p) in self.paras.iter().enumerate() {
            if index < start + p.text.len() {
                return Ok((i, index - start));
            }
            start += p.text.len();
        }
        Err(ArchiveError::document(
            "update",
            format!("index {} is beyond the end of the body", index),
        ))
    }

    fn overlapping(&self, start: usize, end: usize) -> Vec<usize> {
        self.paragraphs()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.start < end && p.end > start)
            .map(|(i, _)| i)
            .collect()
    }

    fn apply(&mut self, request: &Request) -> Result<()> {
        match request {
            Request::InsertText(insert) => {
                let (i, offset) = self.locate(insert.location.index)?;
                let inserted: Vec<u16> = insert.text.encode_utf16().collect();
                let mut merged = self.paras[i].text.clone();
                merged.splice(offset..offset, inserted);

                let style = self.paras[i].style;
                let links = std::mem::take(&mut self.paras[i].links);
                let mut pieces: Vec<Para> = merged
                    .split_inclusive(|&u| u == b'\n' as u16)
                    .map(|text| Para {
                        text: text.to_vec(),
                        style,
                        links: Vec::new(),
                    })
                    .collect();
                // The original paragraph keeps its links: it is the last piece when
                // whole lines were inserted in front of it, the first piece otherwise.
                let owner = if offset == 0 && insert.text.ends_with('\n') {
                    pieces.len() - 1
                } else {
                    0
                };
                pieces[owner].links = links;
                self.paras.splice(i..=i, pieces);
            }
            Request::UpdateParagraphStyle(update) => {
                for i in self.overlapping(update.range.start_index, update.range.end_index) {
                    self.paras[i].style = update.paragraph_style.named_style_type;
                }
            }
            Request::UpdateTextStyle(update) => {
                let (start, end) = (update.range.start_index, update.range.end_index);
                match &update.text_style.link {
                    Some(link) => {
                        for i in self.overlapping(start, end) {
                            self.paras[i].links.push(link.url.clone());
                        }
                    }
                    // Links are tracked per paragraph: only paragraphs wholly inside the
                    // range lose theirs.
                    None => {
                        for (i, p) in self.paragraphs().iter().enumerate() {
                            if start <= p.start && p.end <= end {
                                self.paras[i].links.clear();
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocument {
    fn fetch_paragraphs(&mut self) -> Result<Vec<Paragraph>> {
        self.fetches += 1;
        Ok(self.paragraphs())
    }

    fn batch_update(&mut self, requests: &[Request]) -> Result<()> {
        if self.fail_updates {
            return Err(ArchiveError::document("update", "HTTP 403: The caller does not have permission"));
        }
        let snapshot = self.paras.clone();
        for request in requests {
            if let Err(e) = self.apply(request) {
                self.paras = snapshot;
                return Err(e);
            }
        }
        self.batches.push(requests.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_in_front_of_paragraph() {
        let mut doc = MemoryDocument::empty();
        doc.batch_update(&[Request::insert_text(1, "Hello\n")]).unwrap();
        let paras = doc.paragraphs();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].text, "Hello\n");
        assert_eq!((paras[1].start, paras[1].end), (7, 8));
    }

    #[test]
    fn insert_before_final_newline_splits() {
        let mut doc = MemoryDocument::with_paragraphs(&[("abc", NamedStyle::NormalText)]);
        doc.batch_update(&[Request::insert_text(4, "\nxyz")]).unwrap();
        let texts: Vec<_> = doc.paragraphs().into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["abc\n", "xyz\n", "\n"]);
    }

    #[test]
    fn insert_at_end_of_body_is_rejected() {
        let mut doc = MemoryDocument::ending_with(&[("abc", NamedStyle::Heading1)]);
        let err = doc.batch_update(&[Request::insert_text(5, "x\n")]).unwrap_err();
        assert!(err.to_string().contains("beyond the end of the body"));
    }

    #[test]
    fn unlink_clears_only_whole_paragraphs() {
        let mut doc = MemoryDocument::with_paragraphs(&[("abc", NamedStyle::NormalText)]);
        doc.batch_update(&[Request::link(1, 4, "https://a.example")]).unwrap();
        doc.batch_update(&[Request::unlink(4, 5)]).unwrap();
        assert_eq!(doc.paragraphs()[0].links, vec!["https://a.example".to_string()]);
        doc.batch_update(&[Request::unlink(1, 5)]).unwrap();
        assert!(doc.paragraphs()[0].links.is_empty());
    }

    #[test]
    fn out_of_range_insert_rolls_back() {
        let mut doc = MemoryDocument::empty();
        let err = doc
            .batch_update(&[Request::insert_text(1, "ok\n"), Request::insert_text(99, "x")])
            .unwrap_err();
        assert!(matches!(err, ArchiveError::DocumentAccess { .. }));
        assert_eq!(doc.paragraphs().len(), 1);
        assert!(doc.batches.is_empty());
    }
}
