//! Line-based `SpeechIo` over a terminal (or any async reader/writer pair).

use anyhow::{Result, bail};
use async_trait::async_trait;
use interview_core::voice::{Heard, SpeechIo};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

pub struct TerminalIo<R, W> {
    lines: Lines<R>,
    out: W,
}

impl TerminalIo<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> TerminalIo<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }
}

#[async_trait]
impl<R, W> SpeechIo for TerminalIo<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.out.write_all(format!("\n{}\n", text.trim()).as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    /// A blank line counts as an unrecognised utterance.
    async fn listen(&mut self) -> Result<Heard> {
        self.out.write_all(b"> ").await?;
        self.out.flush().await?;
        match self.lines.next_line().await? {
            Some(line) if line.trim().is_empty() => Ok(Heard::Unrecognized),
            Some(line) => Ok(Heard::Speech(line.trim().to_string())),
            None => bail!("Input stream closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listen_reads_trimmed_lines() {
        let input = "  first answer  \n\nsecond\n";
        let mut io = TerminalIo::new(BufReader::new(input.as_bytes()), Vec::new());

        assert_eq!(io.listen().await.unwrap(), Heard::Speech("first answer".into()));
        assert_eq!(io.listen().await.unwrap(), Heard::Unrecognized);
        assert_eq!(io.listen().await.unwrap(), Heard::Speech("second".into()));
        assert!(io.listen().await.is_err());
    }

    #[tokio::test]
    async fn test_speak_writes_to_output() {
        let mut io = TerminalIo::new(BufReader::new(&b""[..]), Vec::new());
        io.speak("What is a trait object?").await.unwrap();
        assert_eq!(
            String::from_utf8(io.out).unwrap(),
            "\nWhat is a trait object?\n"
        );
    }
}
