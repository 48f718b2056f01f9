//! Request form state
//!
//! The form owns the selected department: the tree picker only reads it for
//! highlighting and writes it back through a callback. Submission is gated on
//! a selected department and on no other submission being in flight.

use std::collections::HashSet;

use crate::domain::{DepartmentId, Forest, Role, RoleId, Service, ServiceId};

use super::submitter::{RequestSubmitter, SubmitError, SubmitOutcome};

/// Feedback shown under the submit button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMessage {
    Submitted,
    Rejected(String),
    Failed,
}

impl FormMessage {
    pub fn text(&self) -> String {
        match self {
            FormMessage::Submitted => "Request submitted.".to_string(),
            FormMessage::Rejected(error) => format!("Error: {}", error),
            FormMessage::Failed => "An error occurred while submitting the request.".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, FormMessage::Submitted)
    }
}

/// Everything a submission needs, captured when it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub service_id: ServiceId,
    pub role_id: RoleId,
    pub department_id: DepartmentId,
}

/// State of the permission request form
#[derive(Debug, Clone)]
pub struct RequestForm {
    services: Vec<Service>,
    roles: Vec<Role>,
    pending: HashSet<ServiceId>,
    service_id: Option<ServiceId>,
    role_id: Option<RoleId>,
    department_id: Option<DepartmentId>,
    busy: bool,
    message: Option<FormMessage>,
}

impl RequestForm {
    /// Creates the form with the first non-pending service and the first role chosen
    pub fn new(services: Vec<Service>, roles: Vec<Role>, pending: HashSet<ServiceId>) -> Self {
        let service_id = services
            .iter()
            .find(|s| !pending.contains(&s.id))
            .map(|s| s.id.clone());
        let role_id = roles.first().map(|r| r.id.clone());

        Self {
            services,
            roles,
            pending,
            service_id,
            role_id,
            department_id: None,
            busy: false,
            message: None,
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns true if the service already has a pending request
    pub fn is_pending(&self, service_id: &ServiceId) -> bool {
        self.pending.contains(service_id)
    }

    pub fn service_id(&self) -> Option<&ServiceId> {
        self.service_id.as_ref()
    }

    pub fn role_id(&self) -> Option<&RoleId> {
        self.role_id.as_ref()
    }

    pub fn department_id(&self) -> Option<&DepartmentId> {
        self.department_id.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn message(&self) -> Option<&FormMessage> {
        self.message.as_ref()
    }

    /// Chooses a service; pending or unknown services are refused
    pub fn select_service(&mut self, service_id: &ServiceId) -> bool {
        let known = self.services.iter().any(|s| &s.id == service_id);
        if !known || self.is_pending(service_id) {
            return false;
        }
        self.service_id = Some(service_id.clone());
        true
    }

    /// Chooses a role; unknown roles are refused
    pub fn select_role(&mut self, role_id: &RoleId) -> bool {
        if !self.roles.iter().any(|r| &r.id == role_id) {
            return false;
        }
        self.role_id = Some(role_id.clone());
        true
    }

    /// Moves the service choice forward or backward, skipping pending services
    pub fn cycle_service(&mut self, forward: bool) {
        let selectable: Vec<&ServiceId> = self
            .services
            .iter()
            .map(|s| &s.id)
            .filter(|id| !self.pending.contains(*id))
            .collect();
        if let Some(next) = cycle(&selectable, self.service_id.as_ref(), forward) {
            self.service_id = Some(next.clone());
        }
    }

    /// Moves the role choice forward or backward
    pub fn cycle_role(&mut self, forward: bool) {
        let ids: Vec<&RoleId> = self.roles.iter().map(|r| &r.id).collect();
        if let Some(next) = cycle(&ids, self.role_id.as_ref(), forward) {
            self.role_id = Some(next.clone());
        }
    }

    /// Selection callback target for the department tree
    pub fn set_department(&mut self, department_id: &DepartmentId) {
        self.department_id = Some(department_id.clone());
    }

    /// External reset of the department selection
    pub fn clear_department(&mut self) {
        self.department_id = None;
    }

    /// Returns true if pressing submit would start a submission
    pub fn can_submit(&self) -> bool {
        !self.busy
            && self.department_id.is_some()
            && self.service_id.is_some()
            && self.role_id.is_some()
    }

    /// Label for the submit button
    pub fn submit_label(&self) -> &'static str {
        if self.busy {
            "Submitting..."
        } else if self.department_id.is_some() {
            "Submit request"
        } else {
            "Select a department"
        }
    }

    /// `Selected: <name>` feedback; nothing when unselected or unresolvable
    pub fn selected_label(&self, forest: &Forest) -> Option<String> {
        let id = self.department_id.as_ref()?;
        forest
            .resolve_name(id)
            .map(|name| format!("Selected: {}", name))
    }

    /// Starts a submission, marking the form busy.
    ///
    /// Returns `None` while another submission is in flight or nothing
    /// complete is selected; no call must be issued then.
    pub fn begin_submit(&mut self) -> Option<SubmitTicket> {
        if !self.can_submit() {
            return None;
        }

        let ticket = SubmitTicket {
            service_id: self.service_id.clone()?,
            role_id: self.role_id.clone()?,
            department_id: self.department_id.clone()?,
        };
        self.busy = true;
        Some(ticket)
    }

    /// Records the result of the submission started by `begin_submit`
    pub fn finish_submit(
        &mut self,
        ticket: &SubmitTicket,
        result: Result<SubmitOutcome, SubmitError>,
    ) {
        self.busy = false;
        self.message = Some(match result {
            Ok(SubmitOutcome::Accepted { .. }) => {
                self.pending.insert(ticket.service_id.clone());
                if self.service_id.as_ref() == Some(&ticket.service_id) {
                    self.service_id = self
                        .services
                        .iter()
                        .find(|s| !self.pending.contains(&s.id))
                        .map(|s| s.id.clone());
                }
                FormMessage::Submitted
            }
            Ok(SubmitOutcome::Rejected(error)) => FormMessage::Rejected(error),
            Err(_) => FormMessage::Failed,
        });
    }

    /// Runs a whole submission synchronously.
    ///
    /// Returns false without calling the submitter when submission is blocked.
    pub fn submit_with(&mut self, submitter: &dyn RequestSubmitter) -> bool {
        let Some(ticket) = self.begin_submit() else {
            return false;
        };
        let result = submitter.submit(
            &ticket.service_id,
            &ticket.role_id,
            Some(&ticket.department_id),
        );
        self.finish_submit(&ticket, result);
        true
    }
}

fn cycle<'a, T: PartialEq>(items: &[&'a T], current: Option<&T>, forward: bool) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let len = items.len();
    let next = match current.and_then(|c| items.iter().position(|i| *i == c)) {
        Some(pos) if forward => (pos + 1) % len,
        Some(pos) => (pos + len - 1) % len,
        None => 0,
    };
    Some(items[next])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::domain::{Node, RequestId};

    type Call = (ServiceId, RoleId, Option<DepartmentId>);

    /// Records calls and answers with a fixed outcome
    struct Recorder {
        calls: RefCell<Vec<Call>>,
        answer: fn() -> Result<SubmitOutcome, SubmitError>,
    }

    impl Recorder {
        fn answering(answer: fn() -> Result<SubmitOutcome, SubmitError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                answer,
            }
        }
    }

    impl RequestSubmitter for Recorder {
        fn submit(
            &self,
            service_id: &ServiceId,
            role_id: &RoleId,
            department_id: Option<&DepartmentId>,
        ) -> Result<SubmitOutcome, SubmitError> {
            self.calls.borrow_mut().push((
                service_id.clone(),
                role_id.clone(),
                department_id.cloned(),
            ));
            (self.answer)()
        }
    }

    fn accepted() -> Result<SubmitOutcome, SubmitError> {
        Ok(SubmitOutcome::Accepted {
            request_id: "q-1".parse::<RequestId>().unwrap(),
        })
    }

    fn rejected() -> Result<SubmitOutcome, SubmitError> {
        Ok(SubmitOutcome::Rejected("quota exceeded".to_string()))
    }

    fn transport_failure() -> Result<SubmitOutcome, SubmitError> {
        Err(SubmitError::Other(anyhow::anyhow!("connection reset")))
    }

    fn service(id: &str, name: &str) -> Service {
        Service {
            id: id.parse().unwrap(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn role(id: &str, name: &str) -> Role {
        Role {
            id: id.parse().unwrap(),
            name: name.to_string(),
        }
    }

    fn make_form(pending: &[&str]) -> RequestForm {
        RequestForm::new(
            vec![
                service("s-inv", "Inventory"),
                service("s-hr", "HR"),
                service("s-exp", "Expenses"),
            ],
            vec![role("r-gen", "General"), role("r-adm", "Admin")],
            pending.iter().map(|s| s.parse().unwrap()).collect(),
        )
    }

    fn dept(s: &str) -> DepartmentId {
        s.parse().unwrap()
    }

    #[test]
    fn defaults_skip_pending_services() {
        let form = make_form(&["s-inv"]);
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-hr"));
        assert_eq!(form.role_id().map(|r| r.as_str()), Some("r-gen"));
        assert_eq!(form.department_id(), None);
    }

    #[test]
    fn pending_services_cannot_be_selected() {
        let mut form = make_form(&["s-inv"]);
        assert!(!form.select_service(&"s-inv".parse().unwrap()));
        assert!(!form.select_service(&"s-unknown".parse().unwrap()));
        assert!(form.select_service(&"s-exp".parse().unwrap()));
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-exp"));
    }

    #[test]
    fn cycling_skips_pending_and_wraps() {
        let mut form = make_form(&["s-hr"]);
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-inv"));

        form.cycle_service(true);
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-exp"));
        form.cycle_service(true);
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-inv"));
        form.cycle_service(false);
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-exp"));

        form.cycle_role(false);
        assert_eq!(form.role_id().map(|r| r.as_str()), Some("r-adm"));
    }

    #[test]
    fn submit_blocked_without_department() {
        let mut form = make_form(&[]);
        let recorder = Recorder::answering(accepted);

        assert!(!form.can_submit());
        assert_eq!(form.submit_label(), "Select a department");
        assert!(!form.submit_with(&recorder));
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn selecting_department_enables_submit() {
        let mut form = make_form(&[]);
        let recorder = Recorder::answering(accepted);

        form.set_department(&dept("A1"));
        assert!(form.can_submit());
        assert_eq!(form.submit_label(), "Submit request");

        assert!(form.submit_with(&recorder));
        let expected: Vec<Call> = vec![(
            "s-inv".parse().unwrap(),
            "r-gen".parse().unwrap(),
            Some(dept("A1")),
        )];
        assert_eq!(*recorder.calls.borrow(), expected);
        assert_eq!(form.message(), Some(&FormMessage::Submitted));
        assert_eq!(form.message().unwrap().text(), "Request submitted.");
    }

    #[test]
    fn second_submit_while_busy_issues_no_call() {
        let mut form = make_form(&[]);
        let recorder = Recorder::answering(accepted);
        form.set_department(&dept("A1"));

        let ticket = form.begin_submit().unwrap();
        assert!(form.is_busy());
        assert_eq!(form.submit_label(), "Submitting...");

        assert!(form.begin_submit().is_none());
        assert!(!form.submit_with(&recorder));
        assert!(recorder.calls.borrow().is_empty());

        form.finish_submit(&ticket, accepted());
        assert!(!form.is_busy());
    }

    #[test]
    fn accepted_service_becomes_pending() {
        let mut form = make_form(&[]);
        form.set_department(&dept("A1"));

        assert!(form.submit_with(&Recorder::answering(accepted)));
        assert!(form.is_pending(&"s-inv".parse().unwrap()));
        assert_eq!(form.service_id().map(|s| s.as_str()), Some("s-hr"));
    }

    #[test]
    fn rejection_message_is_verbatim() {
        let mut form = make_form(&[]);
        form.set_department(&dept("A1"));

        form.submit_with(&Recorder::answering(rejected));
        let message = form.message().unwrap();
        assert!(message.is_error());
        assert_eq!(message.text(), "Error: quota exceeded");
        assert!(!form.is_busy());
        assert!(!form.is_pending(&"s-inv".parse().unwrap()));
    }

    #[test]
    fn transport_failure_shows_generic_message() {
        let mut form = make_form(&[]);
        form.set_department(&dept("A1"));

        form.submit_with(&Recorder::answering(transport_failure));
        assert_eq!(form.message(), Some(&FormMessage::Failed));
        assert_eq!(
            form.message().unwrap().text(),
            "An error occurred while submitting the request."
        );
        assert!(form.can_submit());
    }

    #[test]
    fn selected_label_resolves_through_forest() {
        let forest = Forest::from_roots(vec![Node::with_children(
            dept("A"),
            "Unit A",
            vec![Node::leaf(dept("A1"), "Dept A1")],
        )])
        .unwrap();
        let mut form = make_form(&[]);

        assert_eq!(form.selected_label(&forest), None);

        form.set_department(&dept("A1"));
        assert_eq!(form.selected_label(&forest).as_deref(), Some("Selected: Dept A1"));

        form.set_department(&dept("ZZZ"));
        assert_eq!(form.selected_label(&forest), None);

        form.clear_department();
        assert!(!form.can_submit());
    }

    #[test]
    fn empty_catalog_cannot_submit() {
        let mut form = RequestForm::new(Vec::new(), Vec::new(), HashSet::new());
        form.set_department(&dept("A1"));
        assert!(!form.can_submit());
        assert!(form.begin_submit().is_none());
    }
}
