//! Completion signalling for directed commands and gestures.
//!
//! Every directed command and gesture hands the caller a [`CommandTicket`].
//! The controller resolves the ticket at the exact tick the movement arrives
//! or the gesture finishes. A preempted or replaced command drops its sender
//! without resolving, which the ticket reports as [`TicketStatus::Abandoned`]
//! so cancellation is observable rather than a silent hang.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

/// Where a ticket stands. Terminal statuses are sticky: once `Finished` or
/// `Abandoned` has been observed, later polls return the same answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketStatus {
    /// The command is queued or in flight.
    Pending,
    /// The movement arrived / the gesture completed.
    Finished,
    /// The command was preempted or rejected; this ticket will never finish.
    Abandoned,
}

/// Caller-side handle for one command's completion.
#[derive(Debug)]
pub struct CommandTicket {
    receiver: Receiver<()>,
    observed: Option<TicketStatus>,
}

impl CommandTicket {
    pub fn poll(&mut self) -> TicketStatus {
        if let Some(status) = self.observed {
            return status;
        }
        match self.receiver.try_recv() {
            Ok(()) => {
                self.observed = Some(TicketStatus::Finished);
                TicketStatus::Finished
            }
            Err(TryRecvError::Empty) => TicketStatus::Pending,
            Err(TryRecvError::Disconnected) => {
                self.observed = Some(TicketStatus::Abandoned);
                TicketStatus::Abandoned
            }
        }
    }

    pub fn is_finished(&mut self) -> bool {
        self.poll() == TicketStatus::Finished
    }
}

/// Controller-side resolver. Dropping it without calling
/// [`TicketSender::finish`] abandons the ticket.
#[derive(Debug)]
pub struct TicketSender {
    sender: Sender<()>,
}

impl TicketSender {
    pub fn finish(self) {
        let _ = self.sender.try_send(());
    }
}

/// A connected sender/ticket pair.
pub(crate) fn ticket() -> (TicketSender, CommandTicket) {
    let (sender, receiver) = bounded(1);
    (
        TicketSender { sender },
        CommandTicket {
            receiver,
            observed: None,
        },
    )
}
