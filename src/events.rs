//! Chat events as JSON lines, from stdin or a file.

use std::path::Path;

use anyhow::Context;
use rollcall_core::ChatEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

pub struct EventStream<R> {
    lines: Lines<BufReader<R>>,
    line_no: usize,
}

pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

impl EventStream<BoxedReader> {
    /// Read from `path`, or stdin when no path is given.
    pub async fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let reader: BoxedReader = match path {
            Some(path) => Box::new(
                tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("failed to open event stream {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdin()),
        };
        Ok(EventStream::new(reader))
    }
}

impl<R: AsyncRead + Unpin> EventStream<R> {
    pub fn new(reader: R) -> Self {
        EventStream {
            lines: BufReader::new(reader).lines(),
            line_no: 0,
        }
    }

    /// Next well-formed event, or `None` at end of stream. Blank lines are
    /// skipped; malformed ones are logged and skipped.
    pub async fn next(&mut self) -> std::io::Result<Option<ChatEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(event) => return Ok(Some(event)),
                Err(err) => tracing::warn!(line = self.line_no, "ignoring malformed event: {err}"),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_events_and_skips_bad_lines() {
        let input = concat!(
            "{\"type\":\"reaction_remove_all\",\"user_id\":\"1\"}\n",
            "\n",
            "not json\n",
            "{\"type\":\"command\",\"name\":\"help\",\"user_id\":\"1\",\"channel_id\":\"2\"}\n",
        );
        let mut stream = EventStream::new(input.as_bytes());

        assert!(matches!(
            stream.next().await.unwrap(),
            Some(ChatEvent::ReactionRemoveAll { .. })
        ));
        let Some(ChatEvent::Command(invocation)) = stream.next().await.unwrap() else {
            panic!("expected a command");
        };
        assert_eq!(invocation.name, "help");
        assert!(stream.next().await.unwrap().is_none());
    }
}
