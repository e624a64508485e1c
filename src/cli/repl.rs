use super::render;
use crate::diagnostics::Notice;
use crate::form::{BodyMode, FieldPath, FormEdit};
use crate::session::Session;
use anyhow::{anyhow, bail, Context};
use std::io::{BufRead, Write};
use tracing::debug;

const HELP: &str = "\
commands:
  load [URL|FILE]          load an API document (resets the session)
  tags                     list tags and endpoints
  tag NAME                 select the active tag
  endpoints [TAG]          list endpoints of a tag
  open ENDPOINT            select an endpoint (id, operationId or \"METHOD /path\")
  form                     show the form of the selected endpoint
  set PATH VALUE           set a body field (a.b[0].c)
  include PATH             include an optional body field
  exclude PATH             exclude an optional body field
  add PATH                 append an element to an array of objects
  remove PATH INDEX        remove an element of an array of objects
  mode fields|raw          choose how the JSON body is entered
  override JSON            JSON deep-merged over the built body
  raw JSON                 raw JSON body (switches to raw mode)
  param [IN:]NAME VALUE    set a parameter (IN: path, query, header, cookie)
  field NAME VALUE         set a form-urlencoded field
  auth [SCHEME VALUE]      list schemes or store a credential
  logout                   drop all credentials
  preview                  show the prepared request
  send                     send the request
  response [raw]           show the last response
  detail PATH              show a nested value of the last response (0.owner.name)
  reset                    forget the document and all input
  help                     this text
  quit                     leave
";

/// What the loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented interactive session over any reader and writer
pub struct Repl<R, W> {
    session: Session,
    input: R,
    output: W,
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (s, ""),
    }
}

fn required<'a>(arg: &'a str, usage: &str) -> anyhow::Result<&'a str> {
    if arg.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(arg)
}

fn path_arg(arg: &str, usage: &str) -> anyhow::Result<FieldPath> {
    FieldPath::parse(required(arg, usage)?).map_err(|e| anyhow!(e))
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Repl {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Read commands until `quit` or end of input. Command errors are printed, not returned.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let configured =
            self.session.config().spec_file.is_some() || self.session.config().base_url.is_some();
        if configured {
            if let Err(e) = self.execute("load") {
                writeln!(self.output, "error: {e:#}")?;
            }
        }

        let mut line = String::new();
        loop {
            write!(self.output, "apiform> ")?;
            self.output.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            match self.execute(&line) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(self.output, "error: {e:#}")?,
            }
        }
        Ok(())
    }

    fn print(&mut self, text: &str) -> anyhow::Result<()> {
        self.output.write_all(text.as_bytes())?;
        Ok(())
    }

    fn print_notices(&mut self, notices: &[Notice]) -> anyhow::Result<()> {
        self.print(&render::notices(notices))
    }

    fn edit(&mut self, edit: FormEdit) -> anyhow::Result<()> {
        let view = self.session.edit(None, &edit)?;
        self.print(&render::form_view(&view))?;
        self.print_notices(&view.notices)
    }

    /// Run one command line
    pub fn execute(&mut self, line: &str) -> anyhow::Result<Flow> {
        let (command, rest) = split_word(line);
        debug!(command, "shell command");
        match command {
            "" => {}
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => self.print(HELP)?,
            "load" => {
                let source = (!rest.is_empty()).then_some(rest);
                let notices = self.session.load(source)?;
                let summary = self
                    .session
                    .spec()
                    .map(|s| {
                        format!(
                            "loaded {} ({} tags, {} endpoints)\n",
                            s.title.as_deref().unwrap_or(&s.source),
                            s.groups.len(),
                            s.groups.values().map(Vec::len).sum::<usize>()
                        )
                    })
                    .unwrap_or_default();
                self.print(&summary)?;
                self.print_notices(&notices)?;
            }
            "reset" => {
                self.session.reset();
                self.print("session reset\n")?;
            }
            "tags" => {
                let text = render::tags(&self.session);
                self.print(&text)?;
            }
            "tag" => {
                self.session.set_active_tag(required(rest, "tag NAME")?)?;
            }
            "endpoints" => {
                let tag = (!rest.is_empty()).then_some(rest);
                let mut text = String::new();
                for endpoint in self.session.endpoints(tag)? {
                    text.push_str(&format!(
                        "  {:<7} {:<40} {}  [{}]\n",
                        endpoint.method.as_str(),
                        endpoint.path,
                        endpoint.summary().unwrap_or_default(),
                        endpoint.id
                    ));
                }
                self.print(&text)?;
            }
            "open" => {
                self.session.open(required(rest, "open ENDPOINT")?)?;
                let screen = self.session.form(None)?;
                self.print(&render::form_screen(&screen))?;
            }
            "form" => {
                let screen = self.session.form(None)?;
                self.print(&render::form_screen(&screen))?;
            }
            "set" => {
                let (path, value) = split_word(rest);
                let path = path_arg(path, "set PATH VALUE")?;
                self.edit(FormEdit::SetValue {
                    path,
                    input: value.to_string(),
                })?;
            }
            "include" | "exclude" => {
                let path = path_arg(rest, "include|exclude PATH")?;
                self.edit(FormEdit::SetIncluded {
                    path,
                    included: command == "include",
                })?;
            }
            "add" => {
                let path = path_arg(rest, "add PATH")?;
                self.edit(FormEdit::AppendItem { path })?;
            }
            "remove" => {
                let (path, index) = split_word(rest);
                let path = path_arg(path, "remove PATH INDEX")?;
                let index = required(index, "remove PATH INDEX")?
                    .parse::<usize>()
                    .context("INDEX must be a non-negative integer")?;
                self.edit(FormEdit::RemoveItem { path, index })?;
            }
            "mode" => {
                let mode = BodyMode::parse(rest)
                    .ok_or_else(|| anyhow!("usage: mode fields|raw"))?;
                self.session.set_body_mode(None, mode)?;
            }
            "override" => {
                let notices = self.session.set_override(None, rest)?;
                self.print_notices(&notices)?;
            }
            "raw" => {
                self.session.set_raw_body(None, rest)?;
            }
            "param" => {
                let (name, value) = split_word(rest);
                self.session
                    .set_param(None, required(name, "param [IN:]NAME VALUE")?, value)?;
            }
            "field" => {
                let (name, value) = split_word(rest);
                self.session
                    .set_form_field(None, required(name, "field NAME VALUE")?, value)?;
            }
            "auth" => {
                if rest.is_empty() {
                    let mut text = String::new();
                    for scheme in self.session.schemes() {
                        let set = if self.session.credentials().get(&scheme.name).is_some() {
                            "set"
                        } else {
                            "not set"
                        };
                        text.push_str(&format!(
                            "  {} ({}): {set}\n",
                            scheme.name,
                            scheme.kind.describe()
                        ));
                    }
                    if let Some(status) = self.session.auth_status() {
                        text.push_str(&format!("  status: {status}\n"));
                    }
                    self.print(&text)?;
                } else {
                    let (scheme, value) = split_word(rest);
                    self.session.set_credential(scheme, value)?;
                }
            }
            "logout" => {
                self.session.logout();
                self.print("credentials cleared\n")?;
            }
            "preview" => {
                let preparation = self.session.preview(None)?;
                self.print(&render::preparation(&preparation))?;
            }
            "send" => {
                let outcome = self.session.send(None)?;
                self.print(&render::record(&outcome.record))?;
                self.print_notices(&outcome.notices)?;
            }
            "response" => {
                let text = match self.session.response(None)? {
                    None => "no response yet\n".to_string(),
                    Some(record) if rest == "raw" => render::raw_json(record)
                        .map(|j| format!("{j}\n"))
                        .unwrap_or_else(|| render::record(record)),
                    Some(record) => render::record(record),
                };
                self.print(&text)?;
            }
            "detail" => {
                let path = required(rest, "detail PATH")?;
                let record = self
                    .session
                    .response(None)?
                    .ok_or_else(|| anyhow!("no response yet"))?;
                let text = render::detail(record, path).map_err(|e| anyhow!(e))?;
                self.print(&format!("{text}\n"))?;
            }
            other => bail!("unknown command '{other}' (type `help`)"),
        }
        Ok(Flow::Continue)
    }
}
