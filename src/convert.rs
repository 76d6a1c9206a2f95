use encoding_rs::Encoding;
use std::borrow::Cow;
use std::fs::Permissions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::config::{ConvertConfig, LineEnding};
use crate::domain::header::HeaderRenamer;
use crate::error::{ConvertError, ConvertResult};
use crate::raw_lines::{raw_lines, RawLine};

/// How the source is decoded and the destination terminated.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub encoding: &'static Encoding,
    pub line_ending: LineEnding,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
            line_ending: LineEnding::Lf,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub header: Vec<String>,
    pub data_rows: usize,
}

/// Look up an encoding by its WHATWG label (`utf-8`, `shift_jis`, ...).
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Decode the whole source. A byte order mark wins over the declared
/// encoding and is dropped. Returns the text with the encoding actually used;
/// on malformed input the encoding that was tried is the error.
pub fn decode<'a>(
    bytes: &'a [u8],
    declared: &'static Encoding,
) -> Result<(Cow<'a, str>, &'static Encoding), &'static Encoding> {
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((declared, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| (text, encoding))
        .ok_or(encoding)
}

/// Encode the rewritten CSV back into the source encoding. Encodings that
/// `encoding_rs` cannot produce (UTF-16) fall back to UTF-8.
pub fn encode_output(
    csv_text: &str,
    encoding: &'static Encoding,
    dest: &Path,
) -> ConvertResult<Vec<u8>> {
    let encoding = encoding.output_encoding();
    let (bytes, used, had_errors) = encoding.encode(csv_text);
    if had_errors {
        return Err(ConvertError::Unencodable {
            path: dest.to_path_buf(),
            encoding: used.name(),
        });
    }
    Ok(bytes.into_owned())
}

/// Convert one file into another as described by `config`.
///
/// The result is written to a temporary file next to the destination and
/// renamed over it only once every row has been written, so a failed run
/// never leaves a truncated destination behind.
pub fn convert_file(config: &ConvertConfig) -> ConvertResult<ConvertSummary> {
    let input = config.input_path.as_path();
    let output = config.output_path.as_path();
    let options = ConvertOptions {
        encoding: encoding_for_label(&config.encoding)
            .ok_or_else(|| ConvertError::UnknownEncoding(config.encoding.clone()))?,
        line_ending: config.line_ending,
    };
    let renamer = config.renamer();

    tracing::info!("Converting header of {} into {}", input.display(), output.display());

    let bytes = std::fs::read(input).map_err(|e| ConvertError::file_access(input, e))?;
    let (summary, out) = transcode(&bytes, input, output, &renamer, options)?;

    let dir = destination_dir(output);
    let mut tmp = tempfile::Builder::new()
        .prefix(".csvsnake-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| ConvertError::file_access(output, e))?;
    tracing::debug!("Writing to temporary file {}", tmp.path().display());

    tmp.write_all(&out)
        .map_err(|e| ConvertError::file_access(output, e))?;
    if let Some(perms) = destination_permissions(output) {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| ConvertError::file_access(output, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| ConvertError::file_access(output, e))?;
    tmp.persist(output)
        .map_err(|e| ConvertError::file_access(output, e.error))?;

    tracing::info!(
        "Wrote {} header fields and {} data rows to {}",
        summary.header.len(),
        summary.data_rows,
        output.display()
    );
    Ok(summary)
}

/// Convert an arbitrary reader into an arbitrary writer. The source is read
/// to the end and fully converted before anything is written.
pub fn convert_stream<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    renamer: &HeaderRenamer,
    options: ConvertOptions,
) -> ConvertResult<ConvertSummary> {
    let source = Path::new("<input>");
    let dest = Path::new("<output>");

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ConvertError::file_access(source, e))?;
    let (summary, out) = transcode(&bytes, source, dest, renamer, options)?;

    writer
        .write_all(&out)
        .and_then(|()| writer.flush())
        .map_err(|e| ConvertError::file_access(dest, e))?;
    Ok(summary)
}

fn transcode(
    bytes: &[u8],
    source: &Path,
    dest: &Path,
    renamer: &HeaderRenamer,
    options: ConvertOptions,
) -> ConvertResult<(ConvertSummary, Vec<u8>)> {
    let (text, encoding) =
        decode(bytes, options.encoding).map_err(|encoding| ConvertError::Encoding {
            path: source.to_path_buf(),
            encoding: encoding.name(),
        })?;
    let (summary, csv_text) = rewrite(&text, source, dest, renamer, options.line_ending)?;
    let out = encode_output(&csv_text, encoding, dest)?;
    Ok((summary, out))
}

/// Rename the header and copy every later row. Blank source lines come out
/// as blank lines and count as rows.
fn rewrite(
    text: &str,
    source: &Path,
    dest: &Path,
    renamer: &HeaderRenamer,
    line_ending: LineEnding,
) -> ConvertResult<(ConvertSummary, String)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();
    let mut layout = raw_lines(text).into_iter();
    // `None` stands for a blank line
    let mut next_row = move || match layout.next() {
        Some(RawLine::Blank) => Some(Ok(None)),
        Some(RawLine::Record) | None => records.next().map(|r| r.map(Some)),
    };

    let mut builder = csv::WriterBuilder::new();
    builder.flexible(true).terminator(line_ending.terminator());
    let mut writer = builder.from_writer(Vec::new());

    let header = match next_row() {
        None => {
            return Err(ConvertError::EmptyInput {
                path: source.to_path_buf(),
            })
        }
        Some(row) => match row? {
            Some(first) => {
                let header = renamer.rename_all(first.iter());
                for (from, to) in first.iter().zip(&header) {
                    tracing::debug!("Header field {:?} -> {:?}", from, to);
                }
                for unused in renamer.unused_overrides(first.iter()) {
                    tracing::debug!("Override for {:?} matched no header field", unused);
                }
                writer
                    .write_record(&header)
                    .map_err(|e| write_error(dest, e))?;
                header
            }
            None => {
                writer = write_blank(writer, &builder, line_ending, dest)?;
                Vec::new()
            }
        },
    };

    let mut data_rows = 0usize;
    while let Some(row) = next_row() {
        match row? {
            Some(record) => writer
                .write_record(&record)
                .map_err(|e| write_error(dest, e))?,
            None => writer = write_blank(writer, &builder, line_ending, dest)?,
        }
        data_rows += 1;
    }

    let buf = writer
        .into_inner()
        .map_err(|e| ConvertError::file_access(dest, e.into_error()))?;
    let csv_text = String::from_utf8(buf).map_err(|_| ConvertError::Unencodable {
        path: dest.to_path_buf(),
        encoding: encoding_rs::UTF_8.name(),
    })?;
    Ok((ConvertSummary { header, data_rows }, csv_text))
}

/// A csv writer turns an empty record into `""`, so a blank line is appended
/// to the flushed buffer directly and writing resumes on a fresh writer.
fn write_blank(
    writer: csv::Writer<Vec<u8>>,
    builder: &csv::WriterBuilder,
    line_ending: LineEnding,
    dest: &Path,
) -> ConvertResult<csv::Writer<Vec<u8>>> {
    let mut buf = writer
        .into_inner()
        .map_err(|e| ConvertError::file_access(dest, e.into_error()))?;
    buf.extend_from_slice(line_ending.as_str().as_bytes());
    Ok(builder.from_writer(buf))
}

fn write_error(dest: &Path, err: csv::Error) -> ConvertError {
    if err.is_io_error() {
        ConvertError::file_access(dest, std::io::Error::from(err))
    } else {
        ConvertError::Csv(err)
    }
}

fn destination_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Keep the permissions of a file being replaced; new files get 0644 on unix
/// rather than the 0600 temporary files are created with.
fn destination_permissions(output: &Path) -> Option<Permissions> {
    if let Ok(meta) = std::fs::metadata(output) {
        return Some(meta.permissions());
    }
    #[cfg(unix)]
    let default = {
        use std::os::unix::fs::PermissionsExt;
        Some(Permissions::from_mode(0o644))
    };
    #[cfg(not(unix))]
    let default = None;
    default
}
