//! Events that drive participant transitions

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Ingestion events
    /// A snapshot added characters from others beyond the read cursor
    UnreadArrived,
    /// Pending sends were re-checked against a snapshot
    EchoesChecked { pending_remaining: usize },

    // Read loop events
    /// An iteration observed nothing new; `chars_read` is the cycle total
    ReadFinished { chars_read: usize },
    /// History shrank mid-cycle
    ReadAborted,

    // Reply events
    /// The typing delay elapsed and the reply is ready to be committed
    WriteCommitted { text: String, greeting: bool },
    /// The reply attempt produced nothing usable
    ReplyAbandoned { history_empty: bool },
}
