//! Action panels: the forms behind create, update, delete and the two lookups.
//!
//! A panel is Editing while open with no request in flight, and Pending while
//! `awaiting` holds the ticket of its outstanding request. Closing drops the
//! panel, so a reply that arrives later finds no matching ticket and is not
//! applied to any form. Input is validated before a request is built; an
//! invalid form yields no request.

use crate::api::{NewUser, ROLE_TAGS, Role, User, UserUpdate};
use crate::error::ValidationError;

use super::dispatch::{ApiCall, Ticket};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Create,
    Update,
    Delete,
    FindById,
    FindByRole,
}

impl PanelKind {
    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Create => "Create New User",
            PanelKind::Update => "Update User",
            PanelKind::Delete => "Delete User by ID",
            PanelKind::FindById => "Find User by ID",
            PanelKind::FindByRole => "Find Users by Role",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            PanelKind::Create => "Create",
            PanelKind::Update => "Update",
            PanelKind::Delete => "Delete",
            PanelKind::FindById | PanelKind::FindByRole => "Find",
        }
    }
}

/// Parse a user id typed into a form: a positive integer.
pub fn parse_id(raw: &str) -> Result<u64, ValidationError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidId),
    }
}

/// Loose email shape check: `local@domain.tld`, no whitespace.
pub fn is_email_shaped(raw: &str) -> bool {
    let s = raw.trim();
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(v.to_string())
    }
}

/// Step through the role catalog; `None` means nothing chosen yet.
fn cycle_role(current: Option<usize>, forward: bool) -> Option<usize> {
    let n = ROLE_TAGS.len();
    Some(match (current, forward) {
        (None, true) => 0,
        (None, false) => n - 1,
        (Some(i), true) => (i + 1) % n,
        (Some(i), false) => (i + n - 1) % n,
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub username: String,
    pub email: String,
    pub role: Option<usize>,
    pub password: String,
}

impl CreateForm {
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let username = required(&self.username, "username")?;
        let email = required(&self.email, "email")?;
        if !is_email_shaped(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        let role = self
            .role
            .and_then(|i| ROLE_TAGS.get(i))
            .map(|t| t.role())
            .ok_or(ValidationError::MissingRole)?;
        // Passwords are sent as typed.
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        Ok(NewUser {
            username,
            email,
            role,
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateForm {
    pub id: String,
    pub username: String,
}

impl UpdateForm {
    pub fn validate(&self) -> Result<UserUpdate, ValidationError> {
        let id = parse_id(&self.id)?;
        let username = required(&self.username, "username")?;
        Ok(UserUpdate { id, username })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteForm {
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindByIdForm {
    pub id: String,
    pub found: Option<User>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindByRoleForm {
    pub role: Option<usize>,
    pub found: Option<(Role, Vec<String>)>,
}

impl FindByRoleForm {
    pub fn selected_role(&self) -> Option<Role> {
        self.role.and_then(|i| ROLE_TAGS.get(i)).map(|t| t.role())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelForm {
    Create(CreateForm),
    Update(UpdateForm),
    Delete(DeleteForm),
    FindById(FindByIdForm),
    FindByRole(FindByRoleForm),
}

/// An open panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    pub form: PanelForm,
    pub focus: usize,
    pub awaiting: Option<Ticket>,
    pub error: Option<String>,
}

impl Panel {
    pub fn new(kind: PanelKind) -> Self {
        let form = match kind {
            PanelKind::Create => PanelForm::Create(CreateForm::default()),
            PanelKind::Update => PanelForm::Update(UpdateForm::default()),
            PanelKind::Delete => PanelForm::Delete(DeleteForm::default()),
            PanelKind::FindById => PanelForm::FindById(FindByIdForm::default()),
            PanelKind::FindByRole => PanelForm::FindByRole(FindByRoleForm::default()),
        };
        Self {
            form,
            focus: 0,
            awaiting: None,
            error: None,
        }
    }

    /// Update panel pre-filled from an existing record.
    pub fn update_for(user: &User) -> Self {
        Self {
            form: PanelForm::Update(UpdateForm {
                id: user.id.to_string(),
                username: user.username.clone(),
            }),
            focus: 1,
            awaiting: None,
            error: None,
        }
    }

    pub fn kind(&self) -> PanelKind {
        match self.form {
            PanelForm::Create(_) => PanelKind::Create,
            PanelForm::Update(_) => PanelKind::Update,
            PanelForm::Delete(_) => PanelKind::Delete,
            PanelForm::FindById(_) => PanelKind::FindById,
            PanelForm::FindByRole(_) => PanelKind::FindByRole,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Labels of the input fields, in focus order.
    pub fn field_labels(&self) -> &'static [&'static str] {
        match self.form {
            PanelForm::Create(_) => &["Username", "Email", "Role", "Password"],
            PanelForm::Update(_) => &["User ID", "Username"],
            PanelForm::Delete(_) | PanelForm::FindById(_) => &["User ID"],
            PanelForm::FindByRole(_) => &["Role"],
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_labels().len();
    }

    pub fn focus_prev(&mut self) {
        let n = self.field_labels().len();
        self.focus = (self.focus + n - 1) % n;
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match (&mut self.form, self.focus) {
            (PanelForm::Create(f), 0) => Some(&mut f.username),
            (PanelForm::Create(f), 1) => Some(&mut f.email),
            (PanelForm::Create(f), 3) => Some(&mut f.password),
            (PanelForm::Update(f), 0) => Some(&mut f.id),
            (PanelForm::Update(f), 1) => Some(&mut f.username),
            (PanelForm::Delete(f), _) => Some(&mut f.id),
            (PanelForm::FindById(f), _) => Some(&mut f.id),
            _ => None,
        }
    }

    /// Whether the focused field is a role selector rather than free text.
    pub fn focus_is_role(&self) -> bool {
        matches!(
            (&self.form, self.focus),
            (PanelForm::Create(_), 2) | (PanelForm::FindByRole(_), _)
        )
    }

    /// Whether the focused field holds a secret that must be masked.
    pub fn focus_is_secret(&self) -> bool {
        matches!((&self.form, self.focus), (PanelForm::Create(_), 3))
    }

    /// Input is ignored while a request is in flight.
    pub fn input_char(&mut self, c: char) {
        if self.is_pending() {
            return;
        }
        if let Some(text) = self.focused_text() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.is_pending() {
            return;
        }
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    pub fn cycle_role(&mut self, forward: bool) {
        if self.is_pending() || !self.focus_is_role() {
            return;
        }
        match &mut self.form {
            PanelForm::Create(f) => f.role = cycle_role(f.role, forward),
            PanelForm::FindByRole(f) => f.role = cycle_role(f.role, forward),
            _ => {}
        }
    }

    /// The call a submit would issue, or why the form is not ready.
    pub fn submission(&self) -> Result<ApiCall, ValidationError> {
        match &self.form {
            PanelForm::Create(f) => f.validate().map(ApiCall::Create),
            PanelForm::Update(f) => f.validate().map(ApiCall::Update),
            PanelForm::Delete(f) => parse_id(&f.id).map(ApiCall::DeleteById),
            PanelForm::FindById(f) => parse_id(&f.id).map(ApiCall::FindById),
            PanelForm::FindByRole(f) => f
                .selected_role()
                .map(ApiCall::FindByRole)
                .ok_or(ValidationError::MissingRole),
        }
    }

    /// Submit control enablement.
    pub fn can_submit(&self) -> bool {
        !self.is_pending() && self.submission().is_ok()
    }

    /// Lookup that pre-fills the update form from the server.
    pub fn load_request(&self) -> Option<Result<ApiCall, ValidationError>> {
        match &self.form {
            PanelForm::Update(f) => Some(parse_id(&f.id).map(ApiCall::FindById)),
            _ => None,
        }
    }

    /// Record that `ticket` is now in flight for this panel.
    pub fn begin(&mut self, ticket: Ticket) {
        self.awaiting = Some(ticket);
        self.error = None;
    }

    /// Whether `ticket` is the request this panel is waiting on. Clears the
    /// pending state when it is.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.awaiting == Some(ticket) {
            self.awaiting = None;
            true
        } else {
            false
        }
    }
}
