// Resumes: metadata rows in Postgres, file bytes in the object store.
// Upload is two-phase: POST creates the row, PUT /file sends the bytes.

pub mod handlers;
