use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Unified input reader that handles both file and pipe input with buffered reading
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use "-" for stdin pipe input
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let is_pipe = is_pipe_path(input_path.as_ref());

        let reader: Box<dyn Read> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input_path.as_ref())
                .with_context(|| format!("Cannot open {}", input_path.as_ref().display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, is_pipe })
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Read all remaining data. The decoder works on the whole image at once.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

pub fn is_pipe_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

#[test]
fn reads_whole_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("gif89d-input-{}.gif", std::process::id()));
    std::fs::write(&path, gif89::process::EXAMPLE_DATA)?;

    let mut reader = InputReader::new(&path)?;
    assert!(!reader.is_pipe());
    assert_eq!(reader.read_all()?, gif89::process::EXAMPLE_DATA);

    std::fs::remove_file(&path)?;
    assert!(is_pipe_path(Path::new("-")));
    Ok(())
}
