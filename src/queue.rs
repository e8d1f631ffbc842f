use std::collections::VecDeque;

use crate::types::ResponseItem;

/// What sits in the response queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedEntry {
    Item(ResponseItem),
    /// Audio delivered as a binary frame rather than by reference.
    Audio(Vec<u8>),
}

impl QueuedEntry {
    pub fn is_command(&self) -> bool {
        matches!(self, QueuedEntry::Item(item) if item.is_command())
    }
}

/// Next thing the drain loop should do.
#[derive(Debug, Clone, PartialEq)]
pub enum DrainStep {
    /// Hand this entry to the playback collaborator and wait for it to finish.
    Deliver(QueuedEntry),
    /// A drain pass is already in progress; the new work will be picked up by it.
    Busy,
    /// Nothing left; the drain pass is over.
    Drained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipOutcome {
    pub skipped: usize,
    /// A queued command was among the discarded entries.
    pub command_consumed: bool,
}

/// FIFO of response entries with at most one entry in flight.
#[derive(Debug, Default)]
pub struct ResponseQueue {
    items: VecDeque<QueuedEntry>,
    in_flight: Option<QueuedEntry>,
    running: bool,
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, items: impl IntoIterator<Item = ResponseItem>) {
        self.items.extend(items.into_iter().map(QueuedEntry::Item));
    }

    pub fn push_audio(&mut self, frame: Vec<u8>) {
        self.items.push_back(QueuedEntry::Audio(frame));
    }

    /// Begins a drain pass unless one is active.
    pub fn start_drain(&mut self) -> DrainStep {
        if self.running {
            return DrainStep::Busy;
        }
        self.running = true;
        self.next_step()
    }

    /// Marks the in-flight entry finished and yields the next step of the active pass.
    pub fn complete_current(&mut self) -> DrainStep {
        if !self.running {
            return DrainStep::Drained;
        }
        self.in_flight = None;
        self.next_step()
    }

    fn next_step(&mut self) -> DrainStep {
        match self.items.pop_front() {
            Some(entry) => {
                self.in_flight = Some(entry.clone());
                DrainStep::Deliver(entry)
            }
            None => {
                self.running = false;
                self.in_flight = None;
                DrainStep::Drained
            }
        }
    }

    /// Drops the in-flight entry and everything queued behind it (barge-in).
    pub fn skip(&mut self) -> SkipOutcome {
        let mut outcome = SkipOutcome::default();
        // The in-flight entry was already dispatched, so only queued commands count as consumed.
        if self.in_flight.take().is_some() {
            outcome.skipped += 1;
        }
        for entry in self.items.drain(..) {
            outcome.skipped += 1;
            outcome.command_consumed |= entry.is_command();
        }
        self.running = false;
        outcome
    }

    pub fn front(&self) -> Option<&QueuedEntry> {
        self.items.front()
    }

    pub fn pop_front(&mut self) -> Option<QueuedEntry> {
        self.items.pop_front()
    }

    pub fn in_flight(&self) -> Option<&QueuedEntry> {
        self.in_flight.as_ref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True while a drain pass is active, including while an entry is in flight.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Nothing queued and nothing in flight.
    pub fn is_idle(&self) -> bool {
        !self.running && self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> ResponseItem {
        ResponseItem::builder().with_text(text).build()
    }

    fn delivered_text(step: DrainStep) -> String {
        match step {
            DrainStep::Deliver(QueuedEntry::Item(item)) => item.text().to_string(),
            other => panic!("expected an item, got {:?}", other),
        }
    }

    #[test]
    fn drains_in_arrival_order_one_at_a_time() {
        let mut queue = ResponseQueue::new();
        queue.push(vec![item("a"), item("b")]);

        assert_eq!(delivered_text(queue.start_drain()), "a");
        // A second pass cannot start while one entry is in flight.
        assert_eq!(queue.start_drain(), DrainStep::Busy);

        queue.push(vec![item("c")]);
        assert_eq!(queue.len(), 2);
        assert_eq!(delivered_text(queue.complete_current()), "b");
        assert_eq!(delivered_text(queue.complete_current()), "c");
        assert_eq!(queue.complete_current(), DrainStep::Drained);
        assert!(queue.is_idle());
    }

    #[test]
    fn complete_without_pass_is_drained() {
        let mut queue = ResponseQueue::new();
        assert_eq!(queue.complete_current(), DrainStep::Drained);
        assert_eq!(queue.start_drain(), DrainStep::Drained);
        assert!(!queue.is_running());
    }

    #[test]
    fn skip_reports_consumed_commands() {
        let mut queue = ResponseQueue::new();
        queue.push(vec![item("hello"), item("#smile"), item("bye")]);
        assert_eq!(delivered_text(queue.start_drain()), "hello");

        let outcome = queue.skip();
        assert_eq!(outcome.skipped, 3);
        assert!(outcome.command_consumed);
        assert!(queue.is_idle());
    }

    #[test]
    fn in_flight_command_is_not_consumed_by_skip() {
        let mut queue = ResponseQueue::new();
        queue.push(vec![item("#walk"), item("after")]);
        assert_eq!(delivered_text(queue.start_drain()), "#walk");

        let outcome = queue.skip();
        assert_eq!(outcome.skipped, 2);
        assert!(!outcome.command_consumed);
    }

    #[test]
    fn skip_of_plain_text_consumes_no_command() {
        let mut queue = ResponseQueue::new();
        queue.push(vec![item("# not a command")]);
        queue.push_audio(vec![1, 2, 3]);
        let outcome = queue.skip();
        assert_eq!(outcome.skipped, 2);
        assert!(!outcome.command_consumed);
    }

    #[test]
    fn audio_frames_keep_their_place() {
        let mut queue = ResponseQueue::new();
        queue.push(vec![item("first")]);
        queue.push_audio(vec![9]);
        assert_eq!(queue.len(), 2);
        assert_eq!(delivered_text(queue.start_drain()), "first");
        assert_eq!(queue.complete_current(), DrainStep::Deliver(QueuedEntry::Audio(vec![9])));
        assert_eq!(queue.front(), None);
    }
}
