use std::{
    fs::read_to_string,
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use log::{debug, info};
use terminal_size::{terminal_size, Width};

use crate::{
    editor::markdown_to_html, parse_tags, render, Commands, Config, Credentials, Diary,
    DiaryError, ExternalEditor, NoteDraft, NoteFilter, NotePatch, Palette, Result,
    SharedDisplayMode, Theme, UNTITLED,
};

const DEFAULT_WIDTH: usize = 60;

/// CLI Application handler - processes CLI commands against the journal
pub struct App {
    /// The journal of whoever is signed in
    diary: Diary,

    /// Display mode the theme is pushed to
    display: SharedDisplayMode,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    pub fn new(diary: Diary, display: SharedDisplayMode, config: Config, verbose: bool) -> Self {
        Self {
            diary,
            display,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        debug!("Running command: {:?}", command);
        match command {
            Commands::Login { email, name } => self.login(email, name),
            Commands::Logout => self.logout(),
            Commands::Whoami => self.whoami(),
            Commands::New {
                title,
                content,
                edit,
                tags,
                file,
            } => self.create_note(title, content, file, tags, edit),
            Commands::Edit {
                id,
                title,
                content,
                edit,
                tags,
                file,
            } => self.edit_note(id, title, content, file, tags, edit),
            Commands::Delete { id, force } => self.delete_note(id, force),
            Commands::List {
                query,
                tag,
                limit,
                json,
                brief,
            } => self.list_notes(query, tag, limit, json, brief),
            Commands::View { id, json, html } => self.view_note(id, json, html),
            Commands::Tags => self.list_tags(),
            Commands::Theme { toggle, set } => self.theme(toggle, set),
        }
    }

    /// Hands the journal back so callers can close it.
    pub fn into_diary(self) -> Diary {
        self.diary
    }

    fn palette(&self) -> Palette {
        Palette::for_theme(self.display.current())
    }

    fn width() -> usize {
        terminal_size()
            .map(|(Width(w), _)| w as usize)
            .unwrap_or(DEFAULT_WIDTH)
    }

    fn login(&mut self, email: String, name: Option<String>) -> Result<()> {
        let credentials = Credentials {
            email,
            display_name: name,
        };
        if self.diary.sign_in(&credentials) {
            println!(
                "{}",
                render::header(&self.diary.session().greeting_name())
            );
            println!("{} notes in this journal", self.diary.notes().len());
        } else {
            // The reason was reported to the diagnostic sink.
            println!(
                "Sign-in did not complete; still using the {} journal",
                self.diary.store().scope()
            );
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        if self.diary.sign_out() {
            println!("Signed out. Using the guest journal.");
        } else {
            println!("Sign-out did not complete.");
        }
        Ok(())
    }

    fn whoami(&mut self) -> Result<()> {
        self.diary.refresh_scope();
        let session = self.diary.session();
        match session.identity() {
            Some(identity) => {
                println!("Signed in as {}", identity.greeting_name());
                if let Some(email) = identity.email {
                    println!("Email:   {}", email);
                }
            }
            None => println!("Not signed in"),
        }
        println!("Journal: {}", self.diary.store().scope());
        println!("Notes:   {}", self.diary.store().len());
        println!("Theme:   {}", self.diary.theme());
        if self.verbose {
            println!("Data:    {}", self.config.data_dir.display());
        }
        Ok(())
    }

    /// Resolves note content from the flag, a file or the editor, in that
    /// order. Returns `None` when no source was requested.
    fn gather_content(
        &self,
        content: Option<String>,
        file: Option<PathBuf>,
        edit: bool,
        initial: &str,
    ) -> Result<Option<String>> {
        match (content, file) {
            (Some(c), _) => Ok(Some(markdown_to_html(&c))),
            (_, Some(file_path)) => {
                if !file_path.exists() {
                    return Err(DiaryError::EditorError {
                        message: format!("File not found: {}", file_path.display()),
                    });
                }
                Ok(Some(markdown_to_html(&read_to_string(file_path)?)))
            }
            (None, None) if edit => {
                let editor = ExternalEditor::from_config(&self.config);
                Ok(Some(editor.compose(initial)?))
            }
            (None, None) => Ok(None),
        }
    }

    fn create_note(
        &mut self,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        tags: Option<String>,
        edit: bool,
    ) -> Result<()> {
        let content = self.gather_content(content, file, edit, "")?;
        let draft = NoteDraft {
            title,
            content,
            tags: Some(parse_tags(tags)),
        };

        let id = self.diary.create(draft);
        info!("Created note {}", id);
        println!("Note created with ID: {}", id);
        Ok(())
    }

    fn edit_note(
        &mut self,
        id: String,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        tags: Option<String>,
        edit: bool,
    ) -> Result<()> {
        let Some(existing) = self.diary.get(&id).cloned() else {
            println!("No note with ID {}; nothing changed", id);
            return Ok(());
        };

        let patch = NotePatch {
            title: title.map(|t| {
                if t.trim().is_empty() {
                    UNTITLED.to_string()
                } else {
                    t
                }
            }),
            content: self.gather_content(content, file, edit, &existing.content)?,
            tags: tags.map(|t| parse_tags(Some(t))),
        };

        if patch.is_empty() {
            println!("Nothing to change. Pass --title, --content, --tags or --edit.");
            return Ok(());
        }

        self.diary.update(&id, patch);
        println!("Note {} updated", id);
        Ok(())
    }

    fn delete_note(&mut self, id: String, force: bool) -> Result<()> {
        let Some(note) = self.diary.get(&id).cloned() else {
            println!("No note with ID {}", id);
            return Ok(());
        };

        if !force && !confirm(&format!("Delete \"{}\"? [y/N] ", note.title))? {
            println!("Kept note {}", id);
            return Ok(());
        }

        self.diary.delete(&id);
        println!("Note {} deleted", id);
        Ok(())
    }

    fn list_notes(
        &mut self,
        query: Option<String>,
        tag: Option<String>,
        limit: Option<usize>,
        json: bool,
        brief: bool,
    ) -> Result<()> {
        let filter = NoteFilter::new(query.unwrap_or_default(), tag.unwrap_or_default());
        let palette = self.palette();
        let width = Self::width();
        let greeting = self.diary.session().greeting_name();
        let show_quote = self.config.show_quote;

        let mut view = self.diary.view(&filter);
        if let Some(limit) = limit {
            view.truncate(limit);
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }

        println!("{}", palette.title.apply_to(render::header(&greeting)));
        if show_quote && !brief {
            println!("{}", palette.accent.apply_to(format!("“{}”", render::random_quote())));
        }
        println!();

        if view.is_empty() {
            println!("{}", palette.muted.apply_to(render::EMPTY_STATE));
            return Ok(());
        }

        for note in view {
            if brief {
                println!("{}", render::render_brief(note, &palette));
            } else {
                println!("{}", render::render_card(note, &palette, width));
            }
        }
        Ok(())
    }

    fn view_note(&mut self, id: String, json: bool, html: bool) -> Result<()> {
        let palette = self.palette();
        let width = Self::width();
        let note = self
            .diary
            .get(&id)
            .ok_or_else(|| DiaryError::NoteNotFound { id: id.clone() })?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
        } else if html {
            println!("{}", render::render_html_card(note));
        } else {
            println!("{}", render::render_card(note, &palette, width));
        }
        Ok(())
    }

    fn list_tags(&mut self) -> Result<()> {
        let palette = self.palette();
        let tags = self.diary.tags();
        if tags.is_empty() {
            println!("{}", palette.muted.apply_to("No tags yet"));
            return Ok(());
        }
        for tag in tags {
            println!("{}", palette.tag.apply_to(format!("#{}", tag)));
        }
        Ok(())
    }

    fn theme(&mut self, toggle: bool, set: Option<String>) -> Result<()> {
        let theme = if toggle {
            self.diary.toggle_theme()
        } else if let Some(value) = set {
            let theme: Theme = value.parse()?;
            self.diary.set_theme(theme);
            theme
        } else {
            self.diary.theme()
        };
        println!("Theme: {}", self.palette().title.apply_to(theme));
        Ok(())
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    stdout().flush()?;
    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
