pub mod quiz_dto;
