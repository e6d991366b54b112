use serde::Serialize;

use crate::errors::SerializerError;

pub fn encode<T: Serialize>(input: &T) -> Result<String, SerializerError> {
    serde_json::to_string(input).map_err(|_| SerializerError::InvalidValueType)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ride::Ride;

    #[test]
    fn test_encode() {
        let ride = Ride::new(3, 20, 40);
        assert_eq!(encode(&ride), Ok(r#"{"id":3,"cost":20,"duration":40}"#.to_owned()));
        assert_eq!(encode(&vec![1, 2]), Ok("[1,2]".to_owned()));
    }
}
