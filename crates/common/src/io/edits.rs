use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes one edited pair `(u) (v)` per line, with indices starting at 1.
///
/// An edit toggles the pair, so insertions and deletions look the same.
pub fn write_edits<P, I>(path: P, edits: I) -> io::Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (usize, usize)>,
{
    let file = File::create(path)?;
    let mut file = BufWriter::new(file);
    format_edits(&mut file, edits)?;
    file.flush()
}

pub fn format_edits<W, I>(mut writer: W, edits: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (usize, usize)>,
{
    for (u, v) in edits {
        writeln!(writer, "{} {}", u + 1, v + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_indexed_lines() {
        let mut out = vec![];
        format_edits(&mut out, [(0, 3), (1, 2)]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 4\n2 3\n");

        let mut out = vec![];
        format_edits(&mut out, Vec::<(usize, usize)>::new()).unwrap();
        assert!(out.is_empty());
    }
}
