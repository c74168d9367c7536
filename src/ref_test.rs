// Naive reference model for the shelf: a BTreeMap of books with a
// plain sorted-vec reservation list. Slow but obviously correct.

struct RefBook {
    title: String,
    available: bool,
    borrower: Option<u32>,
    queue: Vec<(u32, u64, u32)>, // (priority, stamp, patron)
}

#[derive(Debug, PartialEq)]
enum RefBorrow {
    NotFound,
    Borrowed,
    AlreadyReserved,
    Reserved,
    Full,
}

#[derive(Debug, PartialEq)]
enum RefReturn {
    NotFound,
    NotBorrower,
    Returned(Option<u32>),
}

struct RefShelf {
    books: BTreeMap<u32, RefBook>,
    clock: u64,
}

impl RefShelf {
    fn new() -> RefShelf {
        RefShelf {
            books: BTreeMap::new(),
            clock: 0,
        }
    }

    fn insert(&mut self, id: u32, title: &str, available: bool) -> bool {
        if self.books.contains_key(&id) {
            return false;
        }
        let book = RefBook {
            title: title.to_string(),
            available,
            borrower: None,
            queue: Vec::new(),
        };
        self.books.insert(id, book);
        true
    }

    fn delete(&mut self, id: u32) -> Option<Vec<u32>> {
        let mut book = self.books.remove(&id)?;
        book.queue.sort();
        Some(book.queue.iter().map(|&(_, _, patron)| patron).collect())
    }

    fn contains(&self, id: u32) -> bool {
        self.books.contains_key(&id)
    }

    fn title(&self, id: u32) -> Option<&str> {
        self.books.get(&id).map(|book| book.title.as_str())
    }

    fn range(&self, lo: u32, hi: u32) -> Vec<u32> {
        if lo > hi {
            return Vec::new();
        }
        self.books.range(lo..=hi).map(|(id, _)| *id).collect()
    }

    fn nearest(&self, target: u32) -> Vec<u32> {
        let dist = |id: u32| (i64::from(id) - i64::from(target)).abs();
        match self.books.keys().map(|&id| dist(id)).min() {
            None => Vec::new(),
            Some(best) => self
                .books
                .keys()
                .copied()
                .filter(|&id| dist(id) == best)
                .collect(),
        }
    }

    fn borrow(&mut self, patron: u32, id: u32, priority: u32) -> RefBorrow {
        let book = match self.books.get_mut(&id) {
            Some(book) => book,
            None => return RefBorrow::NotFound,
        };
        if book.available {
            book.available = false;
            book.borrower = Some(patron);
            RefBorrow::Borrowed
        } else if book.queue.iter().any(|&(_, _, p)| p == patron) {
            RefBorrow::AlreadyReserved
        } else if book.queue.len() == RESERVE_CAPACITY {
            RefBorrow::Full
        } else {
            book.queue.push((priority, self.clock, patron));
            self.clock += 1;
            RefBorrow::Reserved
        }
    }

    fn return_book(&mut self, patron: u32, id: u32) -> RefReturn {
        let book = match self.books.get_mut(&id) {
            Some(book) => book,
            None => return RefReturn::NotFound,
        };
        if book.borrower != Some(patron) {
            return RefReturn::NotBorrower;
        }
        book.available = true;
        book.borrower = None;
        if book.queue.is_empty() {
            return RefReturn::Returned(None);
        }
        let at = book
            .queue
            .iter()
            .enumerate()
            .min_by_key(|&(_, entry)| *entry)
            .map(|(i, _)| i)
            .unwrap();
        let (_, _, next) = book.queue.remove(at);
        book.available = false;
        book.borrower = Some(next);
        RefReturn::Returned(Some(next))
    }
}
