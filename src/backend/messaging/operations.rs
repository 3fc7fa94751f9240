/**
 * Messaging Transforms
 *
 * Pure edits of the data set, run by the handlers inside
 * `Store::update`. Each one either applies its whole edit and returns the
 * affected record, or returns a `ValidationFailure`; the serializer throws
 * partial edits away on failure.
 *
 * Transforms never touch storage or the clock beyond `Utc::now()`, so they
 * are unit-tested directly against a `DataSet`.
 */
use chrono::Utc;
use uuid::Uuid;

use crate::backend::store::ValidationFailure;
use crate::shared::api::{CreateThreadRequest, CreateUserRequest, EditMessageRequest, SendMessageRequest};
use crate::shared::model::{MAX_NAME_LENGTH, MAX_TITLE_LENGTH};
use crate::shared::{ChatThread, DataSet, Message, User};

fn require_user(data: &DataSet, user_id: Uuid) -> Result<&User, ValidationFailure> {
    data.users
        .get(&user_id)
        .ok_or_else(|| ValidationFailure::not_found("user", user_id))
}

/// Register a new user; usernames are unique ignoring case
pub fn create_user(data: &mut DataSet, request: CreateUserRequest) -> Result<User, ValidationFailure> {
    User::validate_username(&request.username)?;
    let username = request.username.trim();

    if data.user_by_username(username).is_some() {
        return Err(ValidationFailure::conflict(format!(
            "username '{}' is already taken",
            username
        )));
    }

    let display_name = request
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| username.to_string());
    if display_name.len() > MAX_NAME_LENGTH {
        return Err(ValidationFailure::bad_input(
            "display_name",
            format!("Display name longer than {} characters", MAX_NAME_LENGTH),
        ));
    }

    let user = User::new(username, display_name);
    data.users.insert(user.id, user.clone());
    Ok(user)
}

/// Open a thread among existing users
pub fn create_thread(
    data: &mut DataSet,
    request: CreateThreadRequest,
) -> Result<ChatThread, ValidationFailure> {
    require_user(data, request.created_by)?;
    for participant in &request.participants {
        require_user(data, *participant)?;
    }

    let title = request
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty());
    if let Some(title) = &title {
        if title.len() > MAX_TITLE_LENGTH {
            return Err(ValidationFailure::bad_input(
                "title",
                format!("Title longer than {} characters", MAX_TITLE_LENGTH),
            ));
        }
    }

    let thread = ChatThread::new(request.created_by, request.participants, title);
    if thread.participants.len() < 2 {
        return Err(ValidationFailure::bad_input(
            "participants",
            "A thread needs at least one participant besides its creator",
        ));
    }

    data.threads.insert(thread.id, thread.clone());
    Ok(thread)
}

/// Append a message to a thread the sender participates in
pub fn send_message(
    data: &mut DataSet,
    thread_id: Uuid,
    request: SendMessageRequest,
) -> Result<Message, ValidationFailure> {
    Message::validate_body(&request.body)?;
    require_user(data, request.sender_id)?;

    let thread = data
        .threads
        .get_mut(&thread_id)
        .ok_or_else(|| ValidationFailure::not_found("thread", thread_id))?;
    if !thread.has_participant(request.sender_id) {
        return Err(ValidationFailure::forbidden(format!(
            "user {} is not a participant of thread {}",
            request.sender_id, thread_id
        )));
    }

    let message = Message::new(thread_id, request.sender_id, request.body);
    thread.touch(message.created_at);
    data.messages.insert(message.id, message.clone());
    Ok(message)
}

/// Replace the body of a message; only its author may edit it
pub fn edit_message(
    data: &mut DataSet,
    message_id: Uuid,
    request: EditMessageRequest,
) -> Result<Message, ValidationFailure> {
    Message::validate_body(&request.body)?;

    let message = data
        .messages
        .get_mut(&message_id)
        .ok_or_else(|| ValidationFailure::not_found("message", message_id))?;
    if message.sender_id != request.actor_id {
        return Err(ValidationFailure::forbidden("only the author can edit a message"));
    }
    if message.deleted {
        return Err(ValidationFailure::conflict("message has been deleted"));
    }

    let now = Utc::now();
    message.body = request.body;
    message.edited_at = Some(now);
    let edited = message.clone();

    if let Some(thread) = data.threads.get_mut(&edited.thread_id) {
        thread.updated_at = now;
    }
    Ok(edited)
}

/// Soft-delete a message; deleting twice is not an error
pub fn delete_message(
    data: &mut DataSet,
    message_id: Uuid,
    actor_id: Uuid,
) -> Result<Message, ValidationFailure> {
    let message = data
        .messages
        .get_mut(&message_id)
        .ok_or_else(|| ValidationFailure::not_found("message", message_id))?;
    if message.sender_id != actor_id {
        return Err(ValidationFailure::forbidden("only the author can delete a message"));
    }
    if message.deleted {
        return Ok(message.clone());
    }

    let now = Utc::now();
    message.deleted = true;
    message.body.clear();
    message.edited_at = Some(now);
    let deleted = message.clone();

    if let Some(thread) = data.threads.get_mut(&deleted.thread_id) {
        thread.updated_at = now;
    }
    Ok(deleted)
}
