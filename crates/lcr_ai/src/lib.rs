pub mod analysis;
pub mod chunking;
pub mod context;
pub mod corpus;
pub mod embeddings;
pub mod groundedness;
pub mod index;
pub mod landlord;
pub mod llm;
pub mod prompts;
pub mod retrieve;
pub mod upstage;
