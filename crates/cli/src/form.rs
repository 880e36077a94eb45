use std::io::{BufRead, Write};

use anyhow::Result;
use expense_core::{EstimateResponse, NumericBounds, RawSelection};
use expense_estimator::{ExpenseEstimator, FormView};

pub struct FormPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> FormPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn run(&mut self, estimator: &ExpenseEstimator) -> Result<()> {
        let form = estimator.form();

        writeln!(self.output, "Total Travel Expense Predictor. type 'exit' to quit.")?;
        for warning in &form.warnings {
            writeln!(self.output, "warning: {warning}")?;
        }

        while let Some(raw) = self.read_selection(&form)? {
            let message = match estimator.submit(raw).into_response() {
                EstimateResponse::Estimate { display, .. } => display,
                EstimateResponse::Incomplete { message, .. } => message,
                EstimateResponse::Error { message } => message,
            };
            writeln!(self.output, "\n{message}\n")?;
        }

        Ok(())
    }

    fn read_selection(&mut self, form: &FormView) -> Result<Option<RawSelection>> {
        let bounds = form.schema.bounds;

        let Some(hotel_nightly_price) =
            self.read_number("Hotel Price ($)", bounds.hotel_nightly_price)?
        else {
            return Ok(None);
        };
        let Some(flight_price) = self.read_number("Flight Price ($)", bounds.flight_price)? else {
            return Ok(None);
        };
        let Some(origin) = self.read_choice("From Location", &form.schema.origins)? else {
            return Ok(None);
        };
        let Some(destination) = self.read_choice("To Location", &form.schema.destinations)? else {
            return Ok(None);
        };
        let Some(days) = self.read_number("Number of Days", bounds.days)? else {
            return Ok(None);
        };
        let Some(flight_class_label) =
            self.read_choice("Flight Type", &form.schema.flight_classes)?
        else {
            return Ok(None);
        };
        let Some(distance_km) = self.read_number("Distance (KM)", bounds.distance_km)? else {
            return Ok(None);
        };
        let Some(stay_place) = self.read_choice("Place of Stay", &form.schema.stay_places)? else {
            return Ok(None);
        };

        Ok(Some(RawSelection {
            hotel_nightly_price,
            flight_price,
            origin,
            destination,
            days,
            flight_class_label,
            distance_km,
            stay_place,
        }))
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("exit") || answer.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        Ok(Some(answer.to_string()))
    }

    fn read_number(&mut self, label: &str, bounds: NumericBounds) -> Result<Option<u32>> {
        let prompt = format!(
            "{label} [{}-{}, default {}]",
            bounds.min, bounds.max, bounds.default
        );
        loop {
            let Some(answer) = self.read_line(&prompt)? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(bounds.default));
            }
            match answer.parse::<u32>() {
                Ok(value) if bounds.contains(value) => return Ok(Some(value)),
                _ => writeln!(
                    self.output,
                    "enter a whole number between {} and {}",
                    bounds.min, bounds.max
                )?,
            }
        }
    }

    fn read_choice(&mut self, label: &str, options: &[String]) -> Result<Option<String>> {
        writeln!(self.output, "{label}:")?;
        for (idx, option) in options.iter().enumerate() {
            writeln!(self.output, "  {idx}) {option}")?;
        }

        loop {
            let Some(answer) = self.read_line("choice")? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(options.first().cloned());
            }

            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|idx| options.get(idx))
                .or_else(|| options.iter().find(|option| **option == answer));
            match picked {
                Some(option) => return Ok(Some(option.clone())),
                None => writeln!(self.output, "pick one of the listed numbers")?,
            }
        }
    }
}
