//! Write HTTP access log files in the Combined Log Format (extended
//! Common Log Format) for access logs (Apache style), as per
//! <https://httpd.apache.org/docs/2.4/logs.html>.

use std::fs::OpenOptions;
use std::mem::swap;
use std::panic;
use std::path::Path;
use std::sync::Mutex;
use std::{time::{Duration, SystemTime, Instant}, io::{stderr, BufWriter}};
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rouille::{Request, Response, ResponseBody};

use crate::warn;

// "06/Dec/2023:02:02:47 +0000"
pub fn write_time(
    outp: &mut impl Write,
    time: SystemTime
) -> Result<()> {
    let dt: DateTime<Utc> = DateTime::from(time);
    write!(outp, "{}", dt.format("%d/%b/%Y:%H:%M:%S +0000"))?;
    Ok(())
}

/// Like the request part in Apache style Combined Log Format
pub fn request_line(request: &Request) -> String {
    // Request does not appear to maintain the original request
    // line; thus have to reconstruct it, bummer.
    format!("{} {}", request.method(), request.raw_url())
}

// Apache:
// 18.134.151.89 - - [06/Dec/2023:02:02:47 +0100] "GET /login.jsp HTTP/1.1" 404 447 "-" "'Cloud mapping experiment. Contact research@pdrlabs.net'"
// We also add duration at the end.

pub fn write_combined(
    outp: &mut impl Write,
    request: &Request,
    duration: Duration,
    response: &mut Response, // temporarily swaps out ResponseBody and back
) -> Result<()> {
    // Write the time when the log entry is made, not when the
    // request started
    let now = SystemTime::now();
    write!(outp, "{} - - [", request.remote_addr().ip())?;
    write_time(outp, now)?;
    let len = {
        // The body length is private in ResponseBody, only available
        // by taking it apart and putting it back together:
        let mut responsebody = ResponseBody::empty();
        swap(&mut responsebody, &mut response.data);
        let (data, length) = responsebody.into_reader_and_size();
        responsebody =
            if let Some(len) = length {
                ResponseBody::from_reader_and_size(data, len)
            } else {
                ResponseBody::from_reader(data)
            };
        swap(&mut responsebody, &mut response.data);
        length
    };
    writeln!(outp, "] {:?} {} {} {:?} {:?} {duration:?}",
             request_line(request),
             response.status_code,
             len.unwrap_or(0),
             request.header("referer").unwrap_or("-"),
             request.header("user-agent").unwrap_or("-"),
    )?;
    outp.flush()?;
    Ok(())
}

/// Panic log to stderr.
fn write_panic_stderr(
    request: &Request,
    duration: Duration
) {
    let mut outp = BufWriter::new(stderr().lock());
    // We need to feed stderr to a service like daemontools anyway,
    // hence don't print timestamps.
    let _ = writeln!(&mut outp, "[panic] handling {:?} after {duration:?}",
                     request_line(request));
    let _ = outp.flush();
}

/// Where the access log goes: stderr, or appended to a file.
pub fn open_log_output(
    path: Option<&Path>
) -> Result<Box<dyn Write + Send>> {
    match path {
        None => Ok(Box::new(stderr())),
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)
                .with_context(|| format!("opening log file {path:?}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

// Can't make use of rouille::log_custom since we want the response
// body length and our own line format; thus copy and adapt its code.

pub fn log_combined<F>(
    request: &Request,
    access_log: &Mutex<Box<dyn Write + Send>>,
    handler: F
) -> Response
where
    F: FnOnce() -> Response,
{
    let start_instant = Instant::now();

    // Call the handler and catch panics.
    // Note that we always resume unwinding afterwards.
    let result = panic::catch_unwind(panic::AssertUnwindSafe(handler));
    let elapsed = start_instant.elapsed();

    match result {
        Ok(mut response) => {
            match access_log.lock() {
                Ok(mut outp) =>
                    if let Err(e) = write_combined(&mut *outp, request, elapsed, &mut response) {
                        warn!("could not write to access log: {e:#}")
                    },
                Err(_) => warn!("access log lock is poisoned"),
            }
            response
        }
        Err(payload) => {
            write_panic_stderr(request, elapsed);
            // The panic handler will print the payload contents
            panic::resume_unwind(payload);
        }
    }
}
