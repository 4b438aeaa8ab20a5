//! Depth-first traversal of a parsed document.
//!
//! Comments are interleaved with directives in source order, so a visitor
//! sees the document the way it was written.

use std::ops::ControlFlow;

use crate::ast::{Comment, Directive, Document};

/// One step of a [`Document::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    Comment(&'a Comment),
    /// Emitted for every directive, before `EnterBlock` if it has one.
    Directive(&'a Directive),
    EnterBlock(&'a Directive),
    LeaveBlock(&'a Directive),
}

struct Walker<'a, F> {
    comments: &'a [Comment],
    next_comment: usize,
    visit: F,
}

impl<'a, F> Walker<'a, F>
where
    F: FnMut(Event<'a>) -> ControlFlow<()>,
{
    /// Emit every pending comment that starts before `offset`.
    fn flush_until(&mut self, offset: usize) -> ControlFlow<()> {
        while let Some(comment) = self.comments.get(self.next_comment) {
            if comment.position.offset >= offset {
                break;
            }
            self.next_comment += 1;
            (self.visit)(Event::Comment(comment))?;
        }
        ControlFlow::Continue(())
    }

    fn directives(&mut self, directives: &'a [Directive]) -> ControlFlow<()> {
        for d in directives {
            self.flush_until(d.position().offset)?;
            (self.visit)(Event::Directive(d))?;
            if let Some(block) = &d.block {
                self.flush_until(block.open.offset)?;
                (self.visit)(Event::EnterBlock(d))?;
                self.directives(&block.directives)?;
                self.flush_until(block.close.offset)?;
                (self.visit)(Event::LeaveBlock(d))?;
            }
        }
        ControlFlow::Continue(())
    }
}

impl Document {
    /// Visit every directive and comment in source order. Returning
    /// `ControlFlow::Break` from the visitor stops the walk early.
    pub fn walk<'a, F>(&'a self, visit: F) -> ControlFlow<()>
    where
        F: FnMut(Event<'a>) -> ControlFlow<()>,
    {
        let mut walker = Walker {
            comments: &self.comments,
            next_comment: 0,
            visit,
        };
        walker.directives(&self.directives)?;
        walker.flush_until(usize::MAX)
    }
}
