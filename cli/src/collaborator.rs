use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use plan_session::collaborator::decode_reply;
use plan_session::{CollaboratorError, RewriteCollaborator, RewriteReply, RewriteRequest};
use tracing::debug;

/// Runs an external program as the rewrite collaborator.
///
/// The request goes to the program's stdin as JSON; stdout must hold a JSON
/// reply `{"markdown": ..., "findings": [...], "next_question": ...}`.
pub struct ProcessCollaborator {
    program: String,
    args: Vec<String>,
}

impl ProcessCollaborator {
    /// `command[0]` is the program, the rest its arguments. `None` if empty.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(ProcessCollaborator {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl RewriteCollaborator for ProcessCollaborator {
    fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteReply, CollaboratorError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| CollaboratorError::Transport(format!("cannot encode request: {}", e)))?;

        debug!(program = %self.program, bytes = payload.len(), "spawning collaborator");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                CollaboratorError::Transport(format!("cannot start '{}': {}", self.program, e))
            })?;

        // stdin is written while stdout drains; a child may answer before
        // it has read the whole request.
        let stdin = child.stdin.take();
        let (sent, output) = thread::scope(|scope| {
            let writer = scope.spawn(|| match stdin {
                Some(mut stdin) => stdin.write_all(&payload),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let sent = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (sent, output)
        });

        let output =
            output.map_err(|e| CollaboratorError::Transport(format!("cannot read reply: {}", e)))?;
        match sent {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!(program = %self.program, "collaborator closed stdin early");
            }
            Err(e) => {
                return Err(CollaboratorError::Transport(format!(
                    "cannot send request: {}",
                    e
                )));
            }
        }
        if !output.status.success() {
            return Err(CollaboratorError::Remote(format!(
                "'{}' exited with {}",
                self.program, output.status
            )));
        }

        decode_reply(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RewriteRequest {
        RewriteRequest {
            markdown: "# Problem".into(),
            instruction: "expand".into(),
            locked_sections: vec![],
        }
    }

    #[test]
    fn empty_command_has_no_collaborator() {
        assert!(ProcessCollaborator::from_command(&[]).is_none());
    }

    #[test]
    fn missing_program_is_a_transport_error() {
        let collaborator =
            ProcessCollaborator::from_command(&["planmd-no-such-program".to_string()]).unwrap();
        assert!(matches!(
            collaborator.rewrite(&request()),
            Err(CollaboratorError::Transport(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn reply_is_read_from_stdout() {
        let script = r##"cat > /dev/null; printf '{"markdown":"# Problem\\n\\nbetter","findings":[{"kind":"missing","text":"pricing"}],"next_question":"Who buys?"}'"##;
        let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        let collaborator = ProcessCollaborator::from_command(&command).unwrap();

        let reply = collaborator.rewrite(&request()).unwrap();
        assert_eq!(reply.markdown, "# Problem\n\nbetter");
        assert_eq!(reply.findings.len(), 1);
        assert_eq!(reply.next_question, "Who buys?");
    }

    #[cfg(unix)]
    #[test]
    fn large_request_streams_through_echoing_program() {
        let markdown = format!("# Problem\n\n{}", "x".repeat(1 << 20));
        let request = RewriteRequest {
            markdown: markdown.clone(),
            instruction: "keep".into(),
            locked_sections: vec!["Problem".into()],
        };
        let collaborator = ProcessCollaborator::from_command(&["cat".to_string()]).unwrap();

        let reply = collaborator.rewrite(&request).unwrap();
        assert_eq!(reply.markdown, markdown);
        assert!(reply.findings.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn program_ignoring_stdin_still_answers() {
        let script = r##"printf '{"markdown":"# Team"}'"##;
        let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        let collaborator = ProcessCollaborator::from_command(&command).unwrap();
        let request = RewriteRequest {
            markdown: "y".repeat(1 << 20),
            ..request()
        };

        assert_eq!(collaborator.rewrite(&request).unwrap().markdown, "# Team");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_a_remote_error() {
        let script = "cat > /dev/null; exit 3";
        let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        let collaborator = ProcessCollaborator::from_command(&command).unwrap();
        assert!(matches!(
            collaborator.rewrite(&request()),
            Err(CollaboratorError::Remote(_))
        ));
    }
}
