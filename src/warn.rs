//! Printing statements to stderr, for warnings and (optionally) for
//! informational messages about what the server is doing.

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether `info!` prints anything. Set once from the configuration
/// at startup, via `set_verbose`.
pub static DO_INFO: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(on: bool) {
    DO_INFO.store(on, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    DO_INFO.load(Ordering::SeqCst)
}

#[macro_export]
macro_rules! warn {
    ($formatstr:expr $(,$arg:expr)*) => { {
        use std::io::Write;
        let mut outp = std::io::BufWriter::new(std::io::stderr().lock());
        let _ = write!(&mut outp, "W: ");
        let _ = write!(&mut outp, $formatstr $(,$arg)*);
        let _ = writeln!(&mut outp, " at {:?} line {}", file!(), line!());
        let _ = outp.flush();
    } }
}

/// Like `warn!` but only prints if verbose mode was switched on,
/// and prefixes the thread id since requests are handled in
/// parallel.
#[macro_export]
macro_rules! info {
    ($formatstr:expr $(,$arg:expr)*) => {
        if $crate::warn::is_verbose() {
            use std::io::Write;
            let mut outp = std::io::BufWriter::new(std::io::stderr().lock());
            let _ = write!(&mut outp, "{:?} I: ", std::thread::current().id());
            let _ = write!(&mut outp, $formatstr $(,$arg)*);
            let _ = writeln!(&mut outp, " at {:?} line {}", file!(), line!());
            let _ = outp.flush();
        }
    }
}
