use thiserror::Error;

/// ShelfError enumerates over all possible errors that this package
/// shall return. Every variant is a recoverable condition reported to
/// the caller; none aborts the session and no failed mutation leaves a
/// partially updated tree behind.
#[derive(Debug, Error, PartialEq)]
pub enum ShelfError {
    /// Operation referenced a book id absent from the index.
    #[error("book {0} not present in the index")]
    NotFound(u32),
    /// Returned by insert() when the book id is already present. The
    /// insert is a complete no-op, including flip accounting.
    #[error("book {0} already present in the index")]
    Duplicate(u32),
    /// Borrow requested by a patron already holding a pending
    /// reservation for the same book.
    #[error("patron {patron} already holds a reservation for book {book}")]
    AlreadyReserved { patron: u32, book: u32 },
    /// Reservation attempted while the book's queue is at capacity.
    /// The reservation is dropped, existing entries are untouched.
    #[error("reservation queue is full")]
    QueueFull,
    /// Pop or peek on an empty reservation queue.
    #[error("reservation queue is empty")]
    QueueEmpty,
    /// Query that needs at least one entry ran against an empty index.
    #[error("index holds no books")]
    IndexEmpty,
    /// Fatal case, breaking one of the red-black rules.
    #[error("consecutive red nodes")]
    ConsecutiveReds,
    /// Fatal case, breaking one of the red-black rules. The String
    /// component of this variant can be used for debugging.
    #[error("unbalanced blacks: {0}")]
    UnbalancedBlacks(String),
    /// Fatal case, index entries are not in sort-order.
    #[error("sort order broken between {0} and {1}")]
    SortError(u32, u32),
    /// Fatal case, a node's child does not point back at it.
    #[error("parent link broken at book {0}")]
    BrokenParentLink(u32),
}
