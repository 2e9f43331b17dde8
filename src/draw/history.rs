use crate::draw::model::Stroke;

/// A stroke filed into a bucket during this session.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeCommit {
    pub bucket: String,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawHistory {
    undo_stack: Vec<StrokeCommit>,
    redo_stack: Vec<StrokeCommit>,
}

impl DrawHistory {
    pub fn commit(&mut self, bucket: impl Into<String>, stroke: Stroke) {
        self.undo_stack.push(StrokeCommit {
            bucket: bucket.into(),
            stroke,
        });
        self.redo_stack.clear();
    }

    /// Commit that `undo` would revert next.
    pub fn peek_undo(&self) -> Option<&StrokeCommit> {
        self.undo_stack.last()
    }

    /// Commit that `redo` would re-apply next.
    pub fn peek_redo(&self) -> Option<&StrokeCommit> {
        self.redo_stack.last()
    }

    pub fn undo(&mut self) -> Option<StrokeCommit> {
        let commit = self.undo_stack.pop()?;
        self.redo_stack.push(commit.clone());
        Some(commit)
    }

    pub fn redo(&mut self) -> Option<StrokeCommit> {
        let commit = self.redo_stack.pop()?;
        self.undo_stack.push(commit.clone());
        Some(commit)
    }

    /// Drop every commit for `bucket`; used once the bucket is cleared so a
    /// redo cannot resurrect its strokes.
    pub fn forget_bucket(&mut self, bucket: &str) {
        self.undo_stack.retain(|c| c.bucket != bucket);
        self.redo_stack.retain(|c| c.bucket != bucket);
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
