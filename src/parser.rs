/*
    Insert(<ride>,<cost>,<duration>) : Book a new ride.
    Print(<ride>) : Show a single ride, (0,0,0) if absent.
    Print(<lo>,<hi>) : Show every ride numbered lo..=hi.
    GetNextRide() : Dispatch the cheapest ride.
    CancelRide(<ride>) : Drop a ride if it exists.
    UpdateTrip(<ride>,<duration>) : Change a ride's trip duration.
 */

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, digit1},
    combinator::{map_res, opt, recognize, rest},
    multi::many0,
    sequence::{delimited, pair},
    IResult,
};

use crate::errors::ParseError;
use crate::ride::RideId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RideCommand<'a> {
    Insert(RideId, i64, i64),
    Print(RideId),
    PrintRange(RideId, RideId),
    GetNextRide,
    CancelRide(RideId),
    UpdateTrip(RideId, i64),
    Unknown(&'a str),
}

/// Parses one whole line; trailing input other than whitespace is rejected.
pub fn parse_line(line: &str) -> Result<RideCommand<'_>, ParseError> {
    match parse_command(line.trim()) {
        Ok((remaining, command)) if remaining.trim().is_empty() => Ok(command),
        _ => Err(ParseError::Malformed(line.trim().to_owned())),
    }
}

pub fn parse_command(input: &str) -> IResult<&str, RideCommand> {
    alt((
        parse_insert_command,
        parse_print_range_command,
        parse_print_command,
        parse_get_next_ride_command,
        parse_cancel_ride_command,
        parse_update_trip_command,
        parse_unknown_command,
    ))(input)
}

fn parse_insert_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("Insert")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, _) = parse_comma(input)?;
    let (input, cost) = parse_number(input)?;
    let (input, _) = parse_comma(input)?;
    let (input, duration) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::Insert(id, cost, duration)))
}

fn parse_print_range_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("Print")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, lo) = parse_number(input)?;
    let (input, _) = parse_comma(input)?;
    let (input, hi) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::PrintRange(lo, hi)))
}

fn parse_print_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("Print")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::Print(id)))
}

fn parse_get_next_ride_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("GetNextRide")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::GetNextRide))
}

fn parse_cancel_ride_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("CancelRide")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::CancelRide(id)))
}

fn parse_update_trip_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, _) = tag("UpdateTrip")(input)?;
    let (input, _) = parse_open(input)?;
    let (input, id) = parse_number(input)?;
    let (input, _) = parse_comma(input)?;
    let (input, duration) = parse_number(input)?;
    let (input, _) = parse_close(input)?;
    Ok((input, RideCommand::UpdateTrip(id, duration)))
}

/// Any `name(...)` that no other parser claimed.
fn parse_unknown_command(input: &str) -> IResult<&str, RideCommand> {
    let (input, name) = take_till1(|c: char| c == '(' || c.is_whitespace())(input)?;
    let (input, _) = parse_whitespace(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = rest(input)?;
    Ok((input, RideCommand::Unknown(name)))
}

fn parse_whitespace(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((char(' '), char('\t'), char('\r'), char('\n')))))(input)
}

fn parse_open(input: &str) -> IResult<&str, char> {
    delimited(parse_whitespace, char('('), parse_whitespace)(input)
}

fn parse_close(input: &str) -> IResult<&str, char> {
    delimited(parse_whitespace, char(')'), parse_whitespace)(input)
}

fn parse_comma(input: &str) -> IResult<&str, char> {
    delimited(parse_whitespace, char(','), parse_whitespace)(input)
}

fn parse_number(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i64>())(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insert_command() {
        let input = "Insert(25,98,46)";
        let expected = Ok(("", RideCommand::Insert(25, 98, 46)));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_insert_command_with_spaces() {
        let input = "Insert ( 25 , -98, 46 )";
        let expected = Ok(("", RideCommand::Insert(25, -98, 46)));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_print_command() {
        let input = "Print(9)";
        let expected = Ok(("", RideCommand::Print(9)));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_print_range_command() {
        let input = "Print(9,20)";
        let expected = Ok(("", RideCommand::PrintRange(9, 20)));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_get_next_ride_command() {
        let input = "GetNextRide()";
        let expected = Ok(("", RideCommand::GetNextRide));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_cancel_ride_command() {
        let input = "CancelRide(77)";
        let expected = Ok(("", RideCommand::CancelRide(77)));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_update_trip_command() {
        let input = "UpdateTrip(53,15)";
        let expected = Ok(("", RideCommand::UpdateTrip(53, 15)));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_unknown_command() {
        let input = "Teleport(1,2)";
        let expected = Ok(("", RideCommand::Unknown("Teleport")));
        assert_eq!(parse_command(input), expected);
    }

    #[test]
    fn test_parse_wrong_arity_is_unknown() {
        assert_eq!(parse_line("Insert(1,2)"), Ok(RideCommand::Unknown("Insert")));
        assert_eq!(parse_line("Print()"), Ok(RideCommand::Unknown("Print")));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  GetNextRide()\r\n"), Ok(RideCommand::GetNextRide));
        assert_eq!(
            parse_line("Insert(1,2,3) junk"),
            Err(ParseError::Malformed("Insert(1,2,3) junk".to_owned()))
        );
        assert_eq!(parse_line("hello"), Err(ParseError::Malformed("hello".to_owned())));
        assert_eq!(
            parse_line("Insert(1,2,99999999999999999999)"),
            Ok(RideCommand::Unknown("Insert"))
        );
    }
}
