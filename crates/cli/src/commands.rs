//! Command scripts driving a [`Coordinator`].
//!
//! One command per line:
//!
//! ```text
//! ADD_SERVER <id> <cache_size>
//! REMOVE_SERVER <id>
//! GET <name>
//! EDIT <name> <content...>
//! STATUS
//! ```
//!
//! Tokens are split on whitespace; a double-quoted token may contain spaces
//! and the escapes `\"` and `\\`. Blank lines and lines starting with `#`
//! are skipped.

use anyhow::{bail, Context};
use serde::Serialize;

use corelib::node::NodeId;
use corelib::partitioner::Partitioner;
use corelib::request::{AppliedEdit, EditEffect};
use corelib::{Coordinator, JoinReport, LeaveReport, Outcome, Request, Response, Topology};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddServer { id: u32, cache_size: usize },
    RemoveServer { id: u32 },
    Get { name: String },
    Edit { name: String, content: String },
    Status,
}

impl Command {
    /// Parses a line; `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let tokens = tokenize(trimmed)?;
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let command = match verb.as_str() {
            "ADD_SERVER" => {
                let [id, cache_size] = args else {
                    bail!("usage: ADD_SERVER <id> <cache_size>");
                };
                Command::AddServer {
                    id: id.parse().with_context(|| format!("bad server id {id:?}"))?,
                    cache_size: cache_size
                        .parse()
                        .with_context(|| format!("bad cache size {cache_size:?}"))?,
                }
            }
            "REMOVE_SERVER" => {
                let [id] = args else {
                    bail!("usage: REMOVE_SERVER <id>");
                };
                Command::RemoveServer {
                    id: id.parse().with_context(|| format!("bad server id {id:?}"))?,
                }
            }
            "GET" => {
                let [name] = args else {
                    bail!("usage: GET <name>");
                };
                Command::Get { name: name.clone() }
            }
            "EDIT" => {
                let Some((name, content)) = args.split_first() else {
                    bail!("usage: EDIT <name> <content...>");
                };
                if content.is_empty() {
                    bail!("usage: EDIT <name> <content...>");
                }
                Command::Edit {
                    name: name.clone(),
                    content: content.join(" "),
                }
            }
            "STATUS" => {
                if !args.is_empty() {
                    bail!("usage: STATUS");
                }
                Command::Status
            }
            other => bail!("unknown command {other:?}"),
        };
        Ok(Some(command))
    }

    /// Runs the command against `coordinator`.
    pub fn execute<P: Partitioner>(
        self,
        coordinator: &mut Coordinator<P>,
    ) -> corelib::Result<CommandResult> {
        Ok(match self {
            Command::AddServer { id, cache_size } => {
                CommandResult::Joined(coordinator.join(NodeId(id), cache_size)?)
            }
            Command::RemoveServer { id } => CommandResult::Left(coordinator.leave(NodeId(id))?),
            Command::Get { name } => CommandResult::Served(coordinator.route(Request::get(name))?),
            Command::Edit { name, content } => {
                CommandResult::Served(coordinator.route(Request::edit(name, content))?)
            }
            Command::Status => CommandResult::Status(coordinator.topology()),
        })
    }
}

/// What a command produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    Joined(JoinReport),
    Left(LeaveReport),
    Served(Response),
    Status(Topology),
    /// Deferred edits run when the input ran out.
    Drained { applied: Vec<AppliedEdit> },
}

impl CommandResult {
    /// Output lines, either human-readable or a single JSON object.
    pub fn render(&self, json: bool) -> anyhow::Result<Vec<String>> {
        if json {
            return Ok(vec![serde_json::to_string(self)?]);
        }

        let mut lines = Vec::new();
        match self {
            CommandResult::Joined(report) => {
                for edit in &report.applied {
                    render_applied(edit, &mut lines);
                }
                let line = match report.donor {
                    Some(donor) => format!(
                        "joined; took {} document(s) from server {donor}",
                        report.moved
                    ),
                    None => "joined an empty ring".to_string(),
                };
                lines.push(log_line(report.node_id, &line));
            }
            CommandResult::Left(report) => {
                for edit in &report.applied {
                    render_applied(edit, &mut lines);
                }
                let line = match report.heir {
                    Some(heir) => format!(
                        "left; handed {} document(s) to server {heir}",
                        report.moved
                    ),
                    None => "left; ring is now empty".to_string(),
                };
                lines.push(log_line(report.node_id, &line));
            }
            CommandResult::Served(response) => {
                for edit in &response.applied {
                    render_applied(edit, &mut lines);
                }
                render_response(response, &mut lines);
            }
            CommandResult::Status(topology) => {
                if topology.members.is_empty() {
                    lines.push("ring is empty".to_string());
                }
                for m in &topology.members {
                    lines.push(format!(
                        "[Server {}]-Status: token={} share={:.2}% documents={} cached={} pending={}",
                        m.node_id,
                        m.token,
                        m.share() * 100.0,
                        m.documents,
                        m.cached,
                        m.pending
                    ));
                }
            }
            CommandResult::Drained { applied } => {
                for edit in applied {
                    render_applied(edit, &mut lines);
                }
            }
        }
        Ok(lines)
    }
}

fn render_applied(edit: &AppliedEdit, lines: &mut Vec<String>) {
    let verb = match edit.effect {
        EditEffect::Created => "created",
        EditEffect::Updated => "updated",
    };
    lines.push(response_line(
        edit.node_id,
        &format!("Document {} has been {verb}", edit.doc_name),
    ));
    lines.push(log_line(edit.node_id, &classification(&edit.outcome, &edit.doc_name)));
}

fn render_response(response: &Response, lines: &mut Vec<String>) {
    let body = match (&response.outcome, &response.payload) {
        (Outcome::LazyDeferred { .. }, _) => format!(
            "Request EDIT {} has been queued for lazy execution",
            response.doc_name
        ),
        (_, Some(content)) => content.clone(),
        (_, None) => "(null)".to_string(),
    };
    lines.push(response_line(response.node_id, &body));
    lines.push(log_line(
        response.node_id,
        &classification(&response.outcome, &response.doc_name),
    ));
}

fn classification(outcome: &Outcome, name: &str) -> String {
    match outcome {
        Outcome::Hit => format!("Cache HIT for {name}"),
        Outcome::Miss => format!("Cache MISS for {name}"),
        Outcome::Evict { evicted } => {
            format!("Cache MISS for {name} - cache full - evict document {evicted}")
        }
        Outcome::Fault => format!("Document {name} doesn't exist"),
        Outcome::LazyDeferred { queued } => {
            format!("Lazy execution of EDIT {name} - {queued} request(s) in queue")
        }
    }
}

fn response_line(node: NodeId, text: &str) -> String {
    format!("[Server {node}]-Response: {text}")
}

fn log_line(node: NodeId, text: &str) -> String {
    format!("[Server {node}]-Log: {text}")
}

/// Splits on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped @ ('"' | '\\')) => token.push(escaped),
                        Some(other) => {
                            token.push('\\');
                            token.push(other);
                        }
                        None => token.push('\\'),
                    },
                    c => token.push(c),
                }
            }
            if !closed {
                bail!("unterminated quote");
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::ClusterConfig;

    fn run(coordinator: &mut Coordinator, line: &str) -> Vec<String> {
        Command::parse(line)
            .unwrap()
            .unwrap()
            .execute(coordinator)
            .unwrap()
            .render(false)
            .unwrap()
    }

    #[test]
    fn test_tokenize_quotes() {
        let tokens = tokenize(r#"EDIT "my doc" "say \"hi\"" tail"#).unwrap();
        assert_eq!(tokens, vec!["EDIT", "my doc", "say \"hi\"", "tail"]);
        assert!(tokenize(r#"GET "open"#).is_err());
        assert_eq!(tokenize(r#"GET """#).unwrap(), vec!["GET", ""]);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("ADD_SERVER 3 10").unwrap(),
            Some(Command::AddServer { id: 3, cache_size: 10 })
        );
        assert_eq!(
            Command::parse("  REMOVE_SERVER 3 ").unwrap(),
            Some(Command::RemoveServer { id: 3 })
        );
        assert_eq!(
            Command::parse("EDIT notes hello   world").unwrap(),
            Some(Command::Edit {
                name: "notes".into(),
                content: "hello world".into()
            })
        );
        assert_eq!(Command::parse("STATUS").unwrap(), Some(Command::Status));
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("# comment").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("ADD_SERVER 3").is_err());
        assert!(Command::parse("ADD_SERVER x 3").is_err());
        assert!(Command::parse("GET").is_err());
        assert!(Command::parse("GET a b").is_err());
        assert!(Command::parse("EDIT a").is_err());
        assert!(Command::parse("STATUS now").is_err());
        assert!(Command::parse("PING").is_err());
    }

    #[test]
    fn test_edit_then_get_output() {
        let mut c = Coordinator::new(ClusterConfig::default()).unwrap();
        run(&mut c, "ADD_SERVER 1 4");

        let lines = run(&mut c, "EDIT report v1");
        assert_eq!(
            lines,
            vec![
                "[Server 1]-Response: Request EDIT report has been queued for lazy execution",
                "[Server 1]-Log: Lazy execution of EDIT report - 1 request(s) in queue",
            ]
        );

        let lines = run(&mut c, "GET report");
        assert_eq!(
            lines,
            vec![
                "[Server 1]-Response: Document report has been created",
                "[Server 1]-Log: Cache MISS for report",
                "[Server 1]-Response: v1",
                "[Server 1]-Log: Cache HIT for report",
            ]
        );

        let lines = run(&mut c, "GET missing");
        assert_eq!(lines[0], "[Server 1]-Response: (null)");
        assert_eq!(lines[1], "[Server 1]-Log: Document missing doesn't exist");
    }

    #[test]
    fn test_membership_output() {
        let mut c = Coordinator::new(ClusterConfig::default()).unwrap();
        assert_eq!(
            run(&mut c, "ADD_SERVER 1 4"),
            vec!["[Server 1]-Log: joined an empty ring"]
        );
        let lines = run(&mut c, "ADD_SERVER 2 4");
        assert!(lines[0].starts_with("[Server 2]-Log: joined; took 0 document(s)"));

        let lines = run(&mut c, "STATUS");
        assert_eq!(lines.len(), 2);

        let lines = run(&mut c, "REMOVE_SERVER 2");
        assert_eq!(
            lines,
            vec!["[Server 2]-Log: left; handed 0 document(s) to server 1"]
        );
    }

    #[test]
    fn test_join_reports_donor_flush() {
        let mut c = Coordinator::new(ClusterConfig::default()).unwrap();
        run(&mut c, "ADD_SERVER 1 2");
        run(&mut c, "EDIT a one");
        run(&mut c, "EDIT b two");

        let lines = run(&mut c, "ADD_SERVER 2 2");
        assert_eq!(
            &lines[..4],
            &[
                "[Server 1]-Response: Document a has been created",
                "[Server 1]-Log: Cache MISS for a",
                "[Server 1]-Response: Document b has been created",
                "[Server 1]-Log: Cache MISS for b",
            ]
        );
        assert!(lines[4].starts_with("[Server 2]-Log: joined; took"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_leave_reports_flushed_edits() {
        let mut c = Coordinator::new(ClusterConfig::default()).unwrap();
        run(&mut c, "ADD_SERVER 1 2");
        run(&mut c, "ADD_SERVER 2 2");
        run(&mut c, "EDIT a one");
        let owner = c.locate("a").unwrap();

        let lines = run(&mut c, &format!("REMOVE_SERVER {owner}"));
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            format!("[Server {owner}]-Response: Document a has been created")
        );
        assert_eq!(lines[1], format!("[Server {owner}]-Log: Cache MISS for a"));
        assert!(lines[2].starts_with(&format!("[Server {owner}]-Log: left; handed 1 document(s)")));
    }

    #[test]
    fn test_json_output() {
        let mut c = Coordinator::new(ClusterConfig::default()).unwrap();
        let result = Command::parse("ADD_SERVER 7 2")
            .unwrap()
            .unwrap()
            .execute(&mut c)
            .unwrap();
        let lines = result.render(true).unwrap();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["result"], "joined");
        assert_eq!(value["node_id"], 7);
    }
}
