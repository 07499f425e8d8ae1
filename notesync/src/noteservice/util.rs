use crate::errors::NoteServiceError;
use crate::noteservice::NoteService;

/// Seed a service with a few notes for development.
pub async fn populate_test_data(service: &dyn NoteService) -> Result<(), NoteServiceError> {
    for text in [
        "hello world",
        "Buy milk on the way home",
        "Write down the three things you want to finish this week",
    ] {
        service.create_note(text.into()).await?;
    }
    Ok(())
}
