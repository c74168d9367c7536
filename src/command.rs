//! Line-oriented command layer over [`Shelf`].
//!
//! One command per line, `Operation(arg1, arg2, ...)`. The core hands
//! back structured results; everything textual, the transcript format
//! included, lives here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ShelfError;
use crate::shelf::{BookEntry, BorrowOutcome, ReturnOutcome, Shelf};

/// Parsed form of one script line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    InsertBook {
        id: u32,
        title: String,
        author: String,
        available: bool,
    },
    PrintBook { id: u32 },
    PrintBooks { lo: u32, hi: u32 },
    BorrowBook { patron: u32, id: u32, priority: u32 },
    ReturnBook { patron: u32, id: u32 },
    DeleteBook { id: u32 },
    FindClosestBook { id: u32 },
    ColorFlipCount,
    Quit,
}

/// Parse one script line. Returns `None` for anything that is not a
/// well-formed known operation.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.replace('"', "");
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let op = line[..open].trim();
    let body = &line[open + 1..close];
    let args: Vec<&str> = if body.trim().is_empty() {
        Vec::new()
    } else {
        body.split(',').map(str::trim).collect()
    };

    let num = |i: usize| -> Option<u32> { args.get(i)?.parse().ok() };

    match op {
        "InsertBook" if args.len() == 4 => Some(Command::InsertBook {
            id: num(0)?,
            title: args[1].to_string(),
            author: args[2].to_string(),
            available: args[3] == "Yes",
        }),
        "PrintBook" => Some(Command::PrintBook { id: num(0)? }),
        "PrintBooks" => Some(Command::PrintBooks {
            lo: num(0)?,
            hi: num(1)?,
        }),
        "BorrowBook" => Some(Command::BorrowBook {
            patron: num(0)?,
            id: num(1)?,
            priority: num(2)?,
        }),
        "ReturnBook" => Some(Command::ReturnBook {
            patron: num(0)?,
            id: num(1)?,
        }),
        "DeleteBook" => Some(Command::DeleteBook { id: num(0)? }),
        "FindClosestBook" => Some(Command::FindClosestBook { id: num(0)? }),
        "ColorFlipCount" => Some(Command::ColorFlipCount),
        "Quit" => Some(Command::Quit),
        _ => None,
    }
}

fn render_book(out: &mut String, entry: &BookEntry) {
    let borrower = match entry.borrower {
        Some(patron) => patron.to_string(),
        None => "None".to_string(),
    };
    let queue: Vec<String> = entry
        .reservations
        .ordered()
        .iter()
        .map(|r| r.patron.to_string())
        .collect();
    out.push_str(&format!(
        "BookID = {}\nTitle = \"{}\"\nAuthor = \"{}\"\nAvailability = \"{}\"\nBorrowedBy = {}\nReservations = [{}]\n\n",
        entry.id,
        entry.title,
        entry.author,
        if entry.available { "Yes" } else { "No" },
        borrower,
        queue.join(",")
    ));
}

/// Run one command against the shelf, appending transcript lines.
/// Returns false once `Quit` is seen.
pub fn execute(shelf: &mut Shelf, cmd: Command, out: &mut String) -> bool {
    match cmd {
        Command::InsertBook {
            id,
            title,
            author,
            available,
        } => {
            // duplicates are silent no-ops, nothing to report.
            let _ = shelf.insert(id, title, author, available);
        }
        Command::PrintBook { id } => match shelf.find(id) {
            Some(entry) => render_book(out, entry),
            None => out.push_str(&format!("Book {} not found in the library\n", id)),
        },
        Command::PrintBooks { lo, hi } => {
            for entry in shelf.range(lo, hi) {
                render_book(out, entry);
            }
        }
        Command::BorrowBook { patron, id, priority } => {
            match shelf.borrow(patron, id, priority) {
                Ok(BorrowOutcome::Borrowed) => {
                    out.push_str(&format!("Book {} Borrowed by Patron {}\n", id, patron))
                }
                Ok(BorrowOutcome::Reserved) => {
                    out.push_str(&format!("Book {} Reserved by Patron {}\n", id, patron))
                }
                Err(ShelfError::AlreadyReserved { .. }) => out.push_str(&format!(
                    "Book {} Already Reserved by Patron {}\n",
                    id, patron
                )),
                Err(ShelfError::QueueFull) => out.push_str(
                    "The Reservation Heap is full and cannot accept any more reservations\n",
                ),
                Err(_) => (), // unknown book: no transcript line.
            }
        }
        Command::ReturnBook { patron, id } => match shelf.return_book(patron, id) {
            Ok(ReturnOutcome::Returned { allotted }) => {
                out.push_str(&format!("Book {} Returned by Patron {}\n", id, patron));
                if let Some(next) = allotted {
                    out.push_str(&format!("Book {} Allotted to Patron {}\n", id, next));
                }
            }
            Ok(ReturnOutcome::NotBorrower) | Err(_) => (),
        },
        Command::DeleteBook { id } => match shelf.delete(id) {
            Ok(patrons) if patrons.is_empty() => {
                out.push_str(&format!("Book {} is no longer available.\n", id))
            }
            Ok(patrons) => {
                let patrons: Vec<String> = patrons.iter().map(u32::to_string).collect();
                out.push_str(&format!(
                    "Book {} is no longer available. Reservations made by Patrons {} have been cancelled!\n",
                    id,
                    patrons.join(",")
                ));
            }
            Err(_) => out.push_str(&format!("Book {} is no longer available.\n", id)),
        },
        Command::FindClosestBook { id } => {
            if let Ok(entries) = shelf.nearest(id) {
                for entry in entries {
                    render_book(out, entry);
                }
            }
        }
        Command::ColorFlipCount => {
            out.push_str(&format!("Color Flip Count : {}\n", shelf.flip_count()))
        }
        Command::Quit => {
            out.push_str("Program Terminated!!\n");
            return false;
        }
    }
    true
}

/// Execute a whole script, returning the transcript.
pub fn run_script(script: &str) -> String {
    let mut shelf = Shelf::new("shelf");
    let mut out = String::new();
    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse(line) {
            Some(cmd) => {
                if !execute(&mut shelf, cmd, &mut out) {
                    break;
                }
            }
            None => out.push_str("Invalid shelf operation\n"),
        }
    }
    out
}

/// Batch driver: read a command file, write the transcript next to it
/// as `<stem>_output_file.txt` and return that path.
pub fn run_file(input: &Path) -> io::Result<PathBuf> {
    let script = fs::read_to_string(input)?;
    let transcript = run_script(&script);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let out_path = input.with_file_name(format!("{}_output_file.txt", stem));
    fs::write(&out_path, transcript)?;
    Ok(out_path)
}
