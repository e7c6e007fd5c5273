//! Thin stand-in for a character-set filter CLI: decodes stdin line by line
//! through the PC-88 table and writes UTF-8 to stdout. Mode selection (which
//! of the four directions/tables to use) and strict-mode exit-code policy
//! belong to the real CLI, not the core.

use std::io::{self, Read, Write};

use fat8img::charset::{decode_line, Charset};

fn main() -> io::Result<()> {
    env_logger::init();

    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;

    let mut remaining = input.as_slice();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    while !remaining.is_empty() {
        let (line, consumed) = decode_line(Charset::Pc88, remaining);
        out.write_all(line.as_bytes())?;
        remaining = &remaining[consumed..];
    }

    Ok(())
}
