//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/camps` | List all camps |
//! | `POST` | `/api/camps` | Create a camp |
//! | `GET` | `/api/camps/{moniker}` | Get a camp (`includeSpeakers`) |
//! | `PUT` | `/api/camps/{moniker}` | Partially update a camp |
//! | `DELETE` | `/api/camps/{moniker}` | Delete a camp |
//! | `GET` | `/api/camps/{moniker}/speakers` | Versioned speaker listing |
//! | `POST` | `/api/camps/{moniker}/speakers` | Create a speaker (auth) |
//! | `GET` | `/api/camps/{moniker}/speakers/{id}` | Get a speaker |
//! | `PUT` | `/api/camps/{moniker}/speakers/{id}` | Update a speaker (owner) |
//! | `DELETE` | `/api/camps/{moniker}/speakers/{id}` | Delete a speaker (owner) |
//! | `GET` | `.../speakers/{id}/talks` | Versioned talk listing |
//! | `POST` | `.../speakers/{id}/talks` | Create a talk (owner, versioned) |
//! | `GET` | `.../talks/{id}` | Get a talk |
//! | `PUT` | `.../talks/{id}` | Update a talk (owner) |
//! | `DELETE` | `.../talks/{id}` | Delete a talk (owner) |
//! | `POST` | `/api/auth/login` | Sign in, set auth cookie |
//! | `POST` | `/api/auth/token` | Issue a bearer token |
//! | `OPTIONS` | `/api/operations/reloadConfig` | Reload configuration |

pub mod auth;
pub mod camps;
pub mod operations;
pub mod speakers;
pub mod talks;
