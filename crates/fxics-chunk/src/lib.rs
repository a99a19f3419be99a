//! Delivers a prepared byte stream to the peer in chunks no larger than a
//! requested size, snapping each chunk to the last cut-mark that fits
//! (§4.4).

/// Sentinel cut-mark value, terminating the sidecar (§4.3, §4.4).
pub const CUTMARK_SENTINEL: u32 = 0xffff_ffff;

/// Magic `buffer_size` value meaning "use the maximum allowed size"
/// (§4.4).
pub const WILDCARD_BUFFER_SIZE: u32 = 0xBABE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Partial,
    Done,
}

/// A [`Chunker`]'s cursor, persisted on the owning session object between
/// `GetBuffer` calls (§3 "chunk cursor": `position`, `next_cutmark_index`,
/// `steps`/`total_steps`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkerState {
    pub position: usize,
    pub next_cutmark_index: usize,
    pub first_requested_size: Option<u32>,
    pub total_step_count: u32,
    pub in_progress_count: u32,
    pub done: bool,
}

/// One `FastTransferSourceGetBuffer` reply (§4.4, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Vec<u8>,
    pub total_step_count: u32,
    pub in_progress_count: u32,
    pub status: TransferStatus,
}

/// Walks a frozen `(buffer, cutmarks)` pair, handing out chunks on
/// successive [`Chunker::get_buffer`] calls. `cutmarks` must be
/// strictly increasing and terminated by [`CUTMARK_SENTINEL`] (§4.3
/// invariant I4).
pub struct Chunker<'a> {
    buffer: &'a [u8],
    cutmarks: &'a [u32],
    cursor: usize,
    next_cutmark_index: usize,
    first_requested_size: Option<u32>,
    total_step_count: u32,
    in_progress_count: u32,
    done: bool,
}

impl<'a> Chunker<'a> {
    pub fn new(buffer: &'a [u8], cutmarks: &'a [u32]) -> Self {
        Chunker {
            buffer,
            cutmarks,
            cursor: 0,
            next_cutmark_index: 0,
            first_requested_size: None,
            total_step_count: 0,
            in_progress_count: 0,
            done: false,
        }
    }

    /// Rebuilds a chunker around a cursor saved between two separate RPC
    /// calls against the same session (§3 "chunk cursor").
    pub fn from_state(buffer: &'a [u8], cutmarks: &'a [u32], state: ChunkerState) -> Self {
        Chunker {
            buffer,
            cutmarks,
            cursor: state.position,
            next_cutmark_index: state.next_cutmark_index,
            first_requested_size: state.first_requested_size,
            total_step_count: state.total_step_count,
            in_progress_count: state.in_progress_count,
            done: state.done,
        }
    }

    /// Snapshots the cursor so it can be persisted on the owning session
    /// object between RPC calls.
    pub fn state(&self) -> ChunkerState {
        ChunkerState {
            position: self.cursor,
            next_cutmark_index: self.next_cutmark_index,
            first_requested_size: self.first_requested_size,
            total_step_count: self.total_step_count,
            in_progress_count: self.in_progress_count,
            done: self.done,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Produces the next chunk. `requested_size` is substituted with
    /// `max_allowed` when it equals [`WILDCARD_BUFFER_SIZE`].
    ///
    /// Panics if called again after a [`TransferStatus::Done`] reply —
    /// re-reading from the same cursor is not supported (§5).
    pub fn get_buffer(&mut self, requested_size: u32, max_allowed: u32) -> Chunk {
        assert!(!self.done, "Chunker::get_buffer called after Done");

        let buffer_size = if requested_size == WILDCARD_BUFFER_SIZE {
            max_allowed
        } else {
            requested_size
        };

        if self.first_requested_size.is_none() {
            self.first_requested_size = Some(buffer_size);
            let size = buffer_size.max(1) as u64;
            self.total_step_count =
                ((self.buffer.len() as u64 + size - 1) / size).max(1) as u32;
        }
        self.in_progress_count += 1;

        let max_cutmark = self.cursor as u64 + buffer_size as u64;

        if max_cutmark >= self.buffer.len() as u64 {
            let data = self.buffer[self.cursor..].to_vec();
            self.cursor = self.buffer.len();
            self.done = true;
            return Chunk {
                data,
                total_step_count: self.total_step_count,
                in_progress_count: self.in_progress_count,
                status: TransferStatus::Done,
            };
        }

        let mut last_fit: Option<usize> = None;
        while self.next_cutmark_index < self.cutmarks.len() {
            let mark = self.cutmarks[self.next_cutmark_index];
            if mark == CUTMARK_SENTINEL || mark as u64 > max_cutmark {
                break;
            }
            if mark as usize > self.cursor {
                last_fit = Some(mark as usize);
            }
            self.next_cutmark_index += 1;
        }

        let chunk_end = last_fit.unwrap_or(max_cutmark as usize);
        let data = self.buffer[self.cursor..chunk_end].to_vec();
        self.cursor = chunk_end;

        Chunk {
            data,
            total_step_count: self.total_step_count,
            in_progress_count: self.in_progress_count,
            status: TransferStatus::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_buffer(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn concatenation_of_all_chunks_is_exact() {
        let buffer = make_buffer(10_000);
        let cutmarks = [100, 500, 900, 4096, 4500, 8000, CUTMARK_SENTINEL];
        let mut chunker = Chunker::new(&buffer, &cutmarks);

        let mut all = Vec::new();
        loop {
            let chunk = chunker.get_buffer(4096, 4096);
            all.extend_from_slice(&chunk.data);
            if chunk.status == TransferStatus::Done {
                break;
            }
        }
        assert_eq!(all, buffer);
    }

    #[test]
    fn snaps_to_the_cutmark_that_equals_the_boundary() {
        let buffer = make_buffer(10_000);
        let cutmarks = [100, 500, 900, 4096, 4500, 8000, CUTMARK_SENTINEL];
        let mut chunker = Chunker::new(&buffer, &cutmarks);

        let c1 = chunker.get_buffer(4096, 4096);
        assert_eq!(c1.data.len(), 4096);
        assert_eq!(c1.status, TransferStatus::Partial);

        let c2 = chunker.get_buffer(4096, 4096);
        assert_eq!(c2.data.len(), 8000 - 4096);
        assert_eq!(c2.status, TransferStatus::Partial);

        let c3 = chunker.get_buffer(4096, 4096);
        assert_eq!(c3.data.len(), 10_000 - 8000);
        assert_eq!(c3.status, TransferStatus::Done);
    }

    #[test]
    fn cursor_resumes_across_separate_chunker_instances() {
        let buffer = make_buffer(10_000);
        let cutmarks = [100, 500, 900, 4096, 4500, 8000, CUTMARK_SENTINEL];

        let mut chunker = Chunker::new(&buffer, &cutmarks);
        let c1 = chunker.get_buffer(4096, 4096);
        let state = chunker.state();
        drop(chunker);

        let mut resumed = Chunker::from_state(&buffer, &cutmarks, state);
        let c2 = resumed.get_buffer(4096, 4096);
        let c3 = resumed.get_buffer(4096, 4096);

        assert_eq!(c1.data.len(), 4096);
        assert_eq!(c2.data.len(), 8000 - 4096);
        assert_eq!(c3.data.len(), 10_000 - 8000);
        assert_eq!(c3.status, TransferStatus::Done);
    }

    #[test]
    fn small_buffer_is_done_in_one_chunk() {
        let buffer = make_buffer(10);
        let cutmarks = [CUTMARK_SENTINEL];
        let mut chunker = Chunker::new(&buffer, &cutmarks);
        let chunk = chunker.get_buffer(0x8000, 0x8000);
        assert_eq!(chunk.data, buffer);
        assert_eq!(chunk.status, TransferStatus::Done);
        assert_eq!(chunk.total_step_count, 1);
    }

    #[test]
    fn wildcard_size_uses_max_allowed() {
        let buffer = make_buffer(20_000);
        let cutmarks = [CUTMARK_SENTINEL];
        let mut chunker = Chunker::new(&buffer, &cutmarks);
        let chunk = chunker.get_buffer(WILDCARD_BUFFER_SIZE, 5_000);
        assert_eq!(chunk.data.len(), 5_000);
        assert_eq!(chunk.status, TransferStatus::Partial);
    }

    #[test]
    #[should_panic(expected = "after Done")]
    fn rereading_after_done_panics() {
        let buffer = make_buffer(10);
        let cutmarks = [CUTMARK_SENTINEL];
        let mut chunker = Chunker::new(&buffer, &cutmarks);
        chunker.get_buffer(0x8000, 0x8000);
        chunker.get_buffer(0x8000, 0x8000);
    }
}
